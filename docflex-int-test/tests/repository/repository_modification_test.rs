use crate::repository::{generate_article, Article, MyModel};
use docflex::bson::doc;
use docflex::bson::oid::ObjectId;
use docflex::client::FindOptions;
use docflex::errors::ErrorKind;
use docflex::repository::Record;
use docflex_int_test::test_util::run_test;

#[tokio::test]
async fn test_model_update() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<MyModel>()?;
        let mut data = Record::new(MyModel {
            text: "initial text".to_string(),
        });

        repo.save(&data).await?;
        assert_eq!(data.text, "initial text");

        repo.update(&mut data, doc! { "text": "Text Updated" }).await?;

        let stored = repo
            .collection()?
            .find_one(doc! { "_id": data.id() }, FindOptions::new())
            .await?
            .expect("stored document");
        assert_eq!(data.text, "Text Updated");
        assert_eq!(stored.get_str("text").ok(), Some("Text Updated"));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_update_unknown_field() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<MyModel>()?;
        let mut data = Record::new(MyModel {
            text: "initial text".to_string(),
        });
        repo.save(&data).await?;

        let err = repo
            .update(&mut data, doc! { "unknown_field": "Text Updated" })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UnknownField);
        assert!(err.message().contains("unknown_field"));
        assert_eq!(data.text, "initial text");
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_update_rejects_whole_change_set() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<Article>()?;
        let mut article = Record::new(generate_article());
        repo.save(&article).await?;
        let before = article.clone();

        let result = repo
            .update(&mut article, doc! { "views": 10, "likes": 3 })
            .await;
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::UnknownField);
        assert_eq!(article, before);

        let stored = repo.find_one(doc! { "_id": article.id() }).await?;
        assert_eq!(stored, Some(before));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_update_only_touches_given_fields() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<Article>()?;
        let mut article = Record::new(generate_article());
        repo.save(&article).await?;

        // a concurrent writer changes another field
        repo.collection()?
            .update_one(
                doc! { "_id": article.id() },
                doc! { "$set": { "author": "someone else" } },
                false,
            )
            .await?;

        repo.update(&mut article, doc! { "views": 42 }).await?;

        let stored = repo.find_one(doc! { "_id": article.id() }).await?.expect("record");
        assert_eq!(stored.views, 42);
        assert_eq!(stored.author, "someone else");
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_update_identifier_is_rejected() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<MyModel>()?;
        let mut data = Record::new(MyModel {
            text: "text".to_string(),
        });
        let id = data.id();

        let err = repo
            .update(&mut data, doc! { "_id": ObjectId::new() })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
        assert_eq!(data.id(), id);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_update_with_wrong_type() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<Article>()?;
        let mut article = Record::new(generate_article());
        repo.save(&article).await?;

        let err = repo
            .update(&mut article, doc! { "tags": "not a list" })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ObjectMappingError);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_empty_update_writes_nothing() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<MyModel>()?;
        let mut data = Record::new(MyModel {
            text: "never saved".to_string(),
        });

        repo.update(&mut data, doc! {}).await?;
        assert!(repo.find_one(doc! { "_id": data.id() }).await?.is_none());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_update_of_unsaved_record_does_not_create_it() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<MyModel>()?;
        let mut data = Record::new(MyModel {
            text: "never saved".to_string(),
        });

        repo.update(&mut data, doc! { "text": "changed" }).await?;
        assert_eq!(data.text, "changed");
        assert!(repo.find_one(doc! { "_id": data.id() }).await?.is_none());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_save_after_local_change() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<Article>()?;
        let mut article = Record::new(generate_article());
        repo.save(&article).await?;

        article.views += 5;
        article.tags.push("edited".to_string());
        repo.save(&article).await?;

        let stored = repo.find_one(doc! { "_id": article.id() }).await?;
        assert_eq!(stored, Some(article));
        Ok(())
    })
    .await
}
