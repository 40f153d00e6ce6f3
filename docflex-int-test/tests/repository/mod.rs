mod record_cursor_test;
mod repository_modification_test;
mod repository_test;
#[cfg(feature = "mongodb")]
mod server_test;

use docflex::bson::oid::ObjectId;
use docflex_derive::Model;
use fake::faker::lorem::en::{Paragraph, Sentence, Words};
use fake::faker::name::en::Name;
use fake::Fake;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Model, Serialize, Deserialize)]
pub struct MyModel {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Model, Serialize, Deserialize)]
pub struct ModelWithFields {
    pub text: String,
    pub datetime: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Model, Serialize, Deserialize)]
#[model(
    index(type = "unique", fields = "title"),
    index(type = "non-unique", fields = "author, views")
)]
pub struct Article {
    pub title: String,
    pub author: String,
    pub body: Option<String>,
    #[serde(default)]
    pub views: i32,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Model, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Model, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Model, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

pub fn generate_article() -> Article {
    Article {
        title: Sentence(3..6).fake::<String>(),
        author: Name().fake::<String>(),
        body: Some(Paragraph(2..4).fake::<String>()),
        views: 0,
        tags: Words(1..4).fake::<Vec<String>>(),
    }
}

pub fn generate_articles(count: usize) -> Vec<Article> {
    let mut articles = Vec::with_capacity(count);
    for i in 0..count {
        let mut article = generate_article();
        // fake sentences may repeat, titles carry a unique index
        article.title = format!("{} #{}", article.title, i);
        article.views = i as i32;
        articles.push(article);
    }
    articles
}
