mod tools;

#[cfg(test)]
mod registry_repo_tests {
    use chrono::Weekday;

    use groom_scheduler_lib::domain::models::ScheduleBoard;
    use groom_scheduler_lib::domain::registry_model::WeeklyTemplate;
    use groom_scheduler_lib::error::AppError;
    use groom_scheduler_lib::infrastructure::registry_repo::RegistryRepository;

    use crate::tools::db::setup_test_db;

    #[tokio::test]
    async fn test_van_crud() {
        let repo = RegistryRepository::new(setup_test_db().await);

        let alpha = repo.add_van("Alpha").await.unwrap();
        let beta = repo.add_van("Beta").await.unwrap();
        repo.update_van(beta, "Bravo").await.unwrap();
        repo.delete_van(alpha).await.unwrap();

        let vans = repo.list_vans(ScheduleBoard::Master).await.unwrap();
        assert_eq!(vans.len(), 1);
        assert_eq!(vans[0].name, "Bravo");
        assert_eq!(repo.find_van(alpha).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_van_is_not_found() {
        let repo = RegistryRepository::new(setup_test_db().await);

        assert!(matches!(repo.update_van(42, "Ghost").await, Err(AppError::NotFound(_))));
        assert!(matches!(repo.delete_van(42).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_groomer_keeps_template_and_inactive_flag() {
        let repo = RegistryRepository::new(setup_test_db().await);
        let template = WeeklyTemplate::from_pairs([(Weekday::Mon, "1"), (Weekday::Fri, "Beta")]);

        let id = repo.add_groomer("Sam", &template, false).await.unwrap();
        let groomer = repo.find_groomer(id).await.unwrap().unwrap();
        assert_eq!(groomer.schedule, template);
        assert!(!groomer.inactive);

        repo.update_groomer(id, "Sam", &WeeklyTemplate::default(), true)
            .await
            .unwrap();
        let groomer = repo.find_groomer(id).await.unwrap().unwrap();
        assert!(groomer.schedule.is_empty());
        assert!(groomer.inactive);

        repo.delete_groomer(id).await.unwrap();
        assert!(matches!(repo.delete_groomer(id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_model_registries_are_separate() {
        let pool = setup_test_db().await;
        sqlx::query("INSERT INTO model_vans (name) VALUES ('What-if')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO model_groomers (name, schedule) VALUES ('Kim', 'not json')")
            .execute(&pool)
            .await
            .unwrap();

        let repo = RegistryRepository::new(pool);
        repo.add_van("Alpha").await.unwrap();

        let model_vans = repo.list_vans(ScheduleBoard::Model).await.unwrap();
        assert_eq!(model_vans.len(), 1);
        assert_eq!(model_vans[0].name, "What-if");

        // 壊れた JSON は空テンプレートとして読む
        let model_groomers = repo.list_groomers(ScheduleBoard::Model).await.unwrap();
        assert_eq!(model_groomers[0].name, "Kim");
        assert!(model_groomers[0].schedule.is_empty());

        assert!(repo.list_groomers(ScheduleBoard::Master).await.unwrap().is_empty());
    }
}
