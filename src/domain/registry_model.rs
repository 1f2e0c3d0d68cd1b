use std::collections::BTreeMap;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::domain::models::{GroomerId, VanId};

//
// Registries (バン / グルーマー)
//

// --- 1. Van (グリッドの行) ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Van {
    pub id: VanId,
    pub name: String,
}

// --- 2. Groomer ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Groomer {
    pub id: GroomerId,
    pub name: String,
    #[serde(default)]
    pub schedule: WeeklyTemplate,
    #[serde(default)]
    pub inactive: bool,
}

/// 曜日名 ("Sunday".."Saturday") -> バン参照 (バンID文字列 もしくは バン名, 空文字は休み)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklyTemplate(pub BTreeMap<String, String>);

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

impl WeeklyTemplate {
    pub fn from_pairs<'a, I: IntoIterator<Item = (Weekday, &'a str)>>(pairs: I) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(weekday, van)| (weekday_name(weekday).to_string(), van.to_string()))
                .collect(),
        )
    }

    /// 指定曜日に割り当てられたバンを解決する
    /// 数値ならID, それ以外はバン名として探す
    pub fn van_for(&self, weekday: Weekday, vans: &[Van]) -> Option<VanId> {
        let reference = self.0.get(weekday_name(weekday))?.trim();
        if reference.is_empty() {
            return None;
        }

        match reference.parse::<VanId>() {
            Ok(id) => vans.iter().find(|van| van.id == id).map(|van| van.id),
            Err(_) => vans
                .iter()
                .find(|van| van.name == reference)
                .map(|van| van.id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|v| v.trim().is_empty())
    }
}

// --- 3. User ---
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub salt: String,
    pub role: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin")
    }
}
