use crate::repository::{generate_articles, Article};
use docflex::bson::doc;
use docflex::errors::ErrorKind;
use docflex::repository::Record;
use docflex_int_test::test_util::run_test;
use futures::{StreamExt, TryStreamExt};

#[tokio::test]
async fn test_cursor_streams_all_records() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<Article>()?;
        for article in generate_articles(5) {
            repo.insert(&Record::new(article)).await?;
        }

        let cursor = repo.find(doc! {}).await?;
        let titles: Vec<String> = cursor
            .map_ok(|record| record.into_inner().title)
            .try_collect()
            .await?;
        assert_eq!(titles.len(), 5);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_cursor_filters_on_array_field() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<Article>()?;
        let mut articles = generate_articles(4);
        articles[1].tags = vec!["rust".to_string(), "db".to_string()];
        articles[3].tags = vec!["rust".to_string()];
        for article in articles {
            repo.insert(&Record::new(article)).await?;
        }

        let found = repo.find(doc! { "tags": "rust" }).await?.collect_all().await?;
        let views: Vec<i32> = found.iter().map(|article| article.views).collect();
        assert_eq!(views, vec![1, 3]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_cursor_reports_bad_documents() {
    run_test(|ctx| async move {
        let repo = ctx.docflex().repository::<Article>()?;
        let collection = repo.collection()?;
        collection
            .insert_one(doc! { "title": "fine", "author": "ada" })
            .await?;
        collection.insert_one(doc! { "title": "no author" }).await?;

        let results: Vec<_> = repo.find(doc! {}).await?.collect().await;
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        let err = results[1].as_ref().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::MissingRequiredField);

        let all = repo.find(doc! {}).await?.collect_all().await;
        assert!(all.is_err());
        Ok(())
    })
    .await
}
