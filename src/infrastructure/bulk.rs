use std::future::Future;

use futures::future::join_all;
use serde::Serialize;

use crate::error::{AppError, Result};

/// 一括書き込みの集計結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    pub total: usize,
    pub written: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,
}

impl BulkOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// 失敗が1件でもあれば全メッセージをまとめたエラーにする
    /// 成功済みの書き込みは巻き戻さない
    pub fn into_result(self) -> Result<BulkOutcome> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(AppError::Bulk {
                failed: self.failures.len(),
                total: self.total,
                messages: self.failures,
            })
        }
    }
}

/// 1セル1書き込みを全部投げて, 全部返ってきてから集計する
/// 書き込み同士の順序は保証しない
pub async fn scatter_gather<I, F, T>(writes: I) -> BulkOutcome
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T>>,
{
    let results = join_all(writes).await;
    let total = results.len();

    let failures: Vec<String> = results
        .into_iter()
        .filter_map(|result| result.err().map(|e| e.to_string()))
        .collect();

    if !failures.is_empty() {
        tracing::warn!("bulk write: {} of {} failed", failures.len(), total);
    }

    BulkOutcome {
        total,
        written: total - failures.len(),
        failures,
    }
}
