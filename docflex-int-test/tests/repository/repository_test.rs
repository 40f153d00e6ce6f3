use crate::repository::{generate_article, Article, Bookmark, ModelWithFields, MyModel, Post, UserProfile};
use docflex::bson::oid::ObjectId;
use docflex::bson::{doc, Bson};
use docflex::client::FindOptions;
use docflex::errors::ErrorKind;
use docflex::model::{FieldSpec, Model, ModelDeclaration};
use docflex::repository::Record;
use docflex_int_test::test_util::run_test;
use serde::{Deserialize, Serialize};

#[tokio::test]
async fn test_save_then_find_raw_document() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<MyModel>()?;
        let data = Record::new(MyModel {
            text: "initial text".to_string(),
        });

        repo.save(&data).await?;

        let stored = repo
            .collection()?
            .find_one(doc! { "_id": data.id() }, FindOptions::new())
            .await?;
        assert_eq!(stored, Some(repo.to_document(&data)?));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_to_document_includes_id_and_nulls() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<ModelWithFields>()?;
        let data = Record::new(ModelWithFields {
            text: "text".to_string(),
            datetime: None,
        });

        assert_eq!(data.text, "text");
        assert!(data.datetime.is_none());
        assert_eq!(
            repo.to_document(&data)?,
            doc! { "_id": data.id(), "text": "text", "datetime": Bson::Null }
        );
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_find_returns_inserted_record() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<MyModel>()?;
        let data = Record::new(MyModel {
            text: "initial text".to_string(),
        });

        repo.collection()?.insert_one(repo.to_document(&data)?).await?;

        let mut cursor = repo.find(doc! { "_id": data.id() }).await?;
        let found = cursor.next_record().await.expect("one record")?;
        assert_eq!(found, data);
        assert_eq!(found.id(), data.id());
        assert_eq!(found.text, data.text);
        assert!(cursor.next_record().await.is_none());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_find_without_match_is_empty() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<MyModel>()?;
        let found = repo.find(doc! { "_id": ObjectId::new() }).await?.collect_all().await?;
        assert!(found.is_empty());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_find_one_returns_inserted_record() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<MyModel>()?;
        let data = Record::new(MyModel {
            text: "initial text".to_string(),
        });
        repo.insert(&data).await?;

        let found = repo.find_one(doc! { "_id": data.id() }).await?;
        assert_eq!(found, Some(data));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_find_one_without_match_is_none() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<MyModel>()?;
        assert!(repo.find_one(doc! { "_id": ObjectId::new() }).await?.is_none());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_save_is_idempotent() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<Article>()?;
        let article = Record::new(generate_article());

        repo.save(&article).await?;
        repo.save(&article).await?;

        let all = repo.find(doc! {}).await?.collect_all().await?;
        assert_eq!(all, vec![article]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_insert_twice_is_client_error() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<Article>()?;
        let article = Record::new(generate_article());
        repo.insert(&article).await?;

        let err = repo.insert(&article).await.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ClientError);
        assert!(err.message().contains("duplicate key"));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_stored_document_with_extra_keys() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<MyModel>()?;
        let id = ObjectId::new();
        repo.collection()?
            .insert_one(doc! { "_id": id, "text": "kept", "legacy": 1 })
            .await?;

        let found = repo.find_one(doc! { "_id": id }).await?.expect("record");
        assert_eq!(found.text, "kept");
        assert_eq!(repo.to_document(&found)?, doc! { "_id": id, "text": "kept" });
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_stored_document_missing_required_field() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<MyModel>()?;
        repo.collection()?.insert_one(doc! { "other": 1 }).await?;

        let err = repo.find_one(doc! {}).await.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::MissingRequiredField);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_renamed_field_is_stored_under_serde_name() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<UserProfile>()?;
        let profile = Record::new(UserProfile {
            name: "ada".to_string(),
            display_name: Some("Ada L.".to_string()),
        });
        repo.save(&profile).await?;

        let stored = repo
            .collection()?
            .find_one(doc! { "displayName": "Ada L." }, FindOptions::new())
            .await?
            .expect("stored document");
        assert_eq!(stored.get_str("name").ok(), Some("ada"));
        assert_eq!(repo.collection()?.name(), "user_profiles");
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_model_with_own_id() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<Bookmark>()?;
        let id = ObjectId::parse_str("5f9c0b9a9d9b3f1d7f9d6b1a").expect("valid hex");
        let bookmark = Record::new(Bookmark {
            id,
            url: "https://www.rust-lang.org".to_string(),
        });
        assert_eq!(bookmark.id(), id);

        repo.save(&bookmark).await?;
        let found = repo.find_one(doc! { "_id": id }).await?.expect("record");
        assert_eq!(found.id, id);
        assert_eq!(found.url, "https://www.rust-lang.org");
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_skipped_empty_field_survives_find() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<Post>()?;
        let post = Record::new(Post {
            title: "t".to_string(),
            tags: Vec::new(),
        });
        repo.save(&post).await?;

        let stored = repo
            .collection()?
            .find_one(doc! { "_id": post.id() }, FindOptions::new())
            .await?;
        assert_eq!(stored, Some(repo.to_document(&post)?));

        let found = repo.find_one(doc! { "_id": post.id() }).await?;
        assert_eq!(found, Some(post));
        assert_eq!(repo.find(doc! {}).await?.collect_all().await?.len(), 1);
        Ok(())
    })
    .await
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Slug {
    #[serde(rename = "_id")]
    id: String,
    url: String,
}

impl Model for Slug {
    fn declaration() -> ModelDeclaration {
        ModelDeclaration::new("Slug")
            .field(FieldSpec::required("_id"))
            .field(FieldSpec::required("url"))
    }
}

#[tokio::test]
async fn test_non_object_id_is_not_saved() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<Slug>()?;
        let slug = Record::new(Slug {
            id: "home".to_string(),
            url: "/".to_string(),
        });

        let err = repo.save(&slug).await.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidDeclaration);
        let err = repo.insert(&slug).await.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidDeclaration);
        assert!(repo.collection()?.find_one(doc! {}, FindOptions::new()).await?.is_none());
        Ok(())
    })
    .await
}
