use crate::repository::{generate_article, generate_articles, Article};
use docflex::bson::doc;
use docflex::client::FindOptions;
use docflex::errors::ErrorKind;
use docflex::repository::Record;
use docflex_int_test::test_util::run_server_test;

#[tokio::test]
async fn test_unique_index_from_derive() {
    run_server_test(|ctx| async move {
        let repo = ctx.docflex().repository::<Article>()?;
        repo.create_indexes().await?;

        let first = generate_article();
        let mut second = generate_article();
        second.title = first.title.clone();

        repo.insert(&Record::new(first)).await?;
        let err = repo.insert(&Record::new(second)).await.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ClientError);
        assert!(err.client_error().is_some());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_find_with_sort_skip_limit() {
    run_server_test(|ctx| async move {
        let repo = ctx.docflex().repository::<Article>()?;
        for article in generate_articles(10) {
            repo.insert(&Record::new(article)).await?;
        }

        let options = FindOptions::new()
            .sort(doc! { "views": -1 })
            .skip(2)
            .limit(3);
        let views: Vec<i32> = repo
            .find_with_options(doc! { "views": { "$gte": 1 } }, options)
            .await?
            .collect_all()
            .await?
            .iter()
            .map(|article| article.views)
            .collect();
        assert_eq!(views, vec![7, 6, 5]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_find_one_with_operators() {
    run_server_test(|ctx| async move {
        let repo = ctx.docflex().repository::<Article>()?;
        for article in generate_articles(4) {
            repo.insert(&Record::new(article)).await?;
        }

        let found = repo
            .find_one_with_options(
                doc! { "$or": [{ "views": 0 }, { "views": { "$gt": 2 } }] },
                FindOptions::new().sort(doc! { "views": -1 }),
            )
            .await?
            .expect("matching article");
        assert_eq!(found.views, 3);

        let none = repo.find_one(doc! { "views": { "$lt": 0 } }).await?;
        assert!(none.is_none());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_save_then_update_on_server() {
    run_server_test(|ctx| async move {
        let repo = ctx.docflex().repository::<Article>()?;
        let mut article = Record::new(generate_article());
        repo.save(&article).await?;
        repo.update(&mut article, doc! { "views": 12 }).await?;

        let stored = repo.find_one(doc! { "_id": article.id() }).await?;
        assert_eq!(stored, Some(article));
        Ok(())
    })
    .await
}
