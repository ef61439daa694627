use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Product-id (as a string key) to quantity.
pub type CartData = BTreeMap<String, i64>;

fn default_available() -> bool {
    true
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub category: String,
    pub new_price: f64,
    pub old_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "Utc::now")]
    pub date: DateTime<Utc>,
    #[serde(default = "default_available")]
    pub available: bool,
}

#[derive(Debug, Deserialize)]
pub struct NewProductInput {
    pub name: String,
    pub image: String,
    pub category: String,
    #[serde(deserialize_with = "number_or_string")]
    pub new_price: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub old_price: f64,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveProductInput {
    pub id: i64,
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "cartData", default)]
    pub cart_data: CartData,
    #[serde(default = "Utc::now")]
    pub date: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "Utc::now")]
    pub date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SignUpInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AdminInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CartItemInput {
    #[serde(rename = "itemId", deserialize_with = "number_or_string")]
    pub item_id: i64,
}

/// Storefront clients send numeric fields either as JSON numbers or as numeric strings.
fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Number(T),
        Text(String),
    }

    match Raw::<T>::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("not a number: {}", s))),
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: String,
}

/// Token payload: exactly one of `user` or `admin` is present.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Subject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<Subject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<usize>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Counter {
    pub _id: String,
    pub seq: i64,
}
