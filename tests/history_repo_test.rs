mod tools;

#[cfg(test)]
mod history_repo_tests {
    use chrono::{TimeZone, Utc};

    use groom_scheduler_lib::domain::models::HistoryRecord;
    use groom_scheduler_lib::infrastructure::history_repo::HistoryRepository;

    use crate::tools::db::{day, setup_test_db};

    fn record(cell_id: &str, date: &str, status: &str, hour: u32) -> HistoryRecord {
        HistoryRecord {
            id: None,
            cell_id: cell_id.to_string(),
            action: "updated".to_string(),
            date: day(date),
            timestamp: Utc.with_ymd_and_hms(2025, 2, 1, hour, 0, 0).unwrap(),
            name: "Sam".to_string(),
            status: status.to_string(),
            note: String::new(),
            user: "admin".to_string(),
        }
    }

    #[tokio::test]
    async fn test_cell_history_is_newest_first() {
        let repo = HistoryRepository::new(setup_test_db().await);

        repo.append(&record("1-2025-01-01", "2025-01-01", "Scheduled", 8)).await.unwrap();
        repo.append(&record("1-2025-01-01", "2025-01-01", "Called Out", 12)).await.unwrap();
        repo.append(&record("1-2025-01-01", "2025-01-01", "Filled In", 10)).await.unwrap();
        repo.append(&record("2-2025-01-01", "2025-01-01", "Scheduled", 9)).await.unwrap();

        let records = repo.find_by_cell("1-2025-01-01").await.unwrap();
        let statuses: Vec<&str> = records.iter().map(|r| r.status.as_str()).collect();
        assert_eq!(statuses, vec!["Called Out", "Filled In", "Scheduled"]);
    }

    #[tokio::test]
    async fn test_report_filters_by_range_and_status() {
        let repo = HistoryRepository::new(setup_test_db().await);

        repo.append(&record("1-2025-01-01", "2025-01-01", "Scheduled", 8)).await.unwrap();
        repo.append(&record("1-2025-01-05", "2025-01-05", "Time Off", 9)).await.unwrap();
        repo.append(&record("2-2025-01-07", "2025-01-07", "Time Off", 10)).await.unwrap();
        repo.append(&record("2-2025-02-01", "2025-02-01", "Time Off", 11)).await.unwrap();

        // 両端を含む
        let in_range = repo
            .report(day("2025-01-01"), day("2025-01-07"), None)
            .await
            .unwrap();
        assert_eq!(in_range.len(), 3);

        let time_off = repo
            .report(day("2025-01-01"), day("2025-01-07"), Some("Time Off"))
            .await
            .unwrap();
        assert_eq!(time_off.len(), 2);
        assert_eq!(time_off[0].cell_id, "2-2025-01-07");

        // "All" は絞り込みなし
        let all = repo
            .report(day("2025-01-01"), day("2025-01-07"), Some("All"))
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
    }
}
