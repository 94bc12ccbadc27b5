mod common;

use common::{insert_question, test_pool};
use trivia_api::db::queries::categories::get_all_categories;
use trivia_api::db::queries::questions::{get_all_questions, get_questions};
use trivia_api::db::QuestionFilter;
use trivia_api::transfer::{export_data, import_data, CATEGORIES_FILE, QUESTIONS_FILE};

#[tokio::test]
async fn export_then_import_restores_rows() {
    let source = test_pool().await;
    insert_question(&source, "What is H2O?", 1, 1).await;
    insert_question(&source, "Who painted the Mona Lisa?", 3, 2).await;
    let dir = tempfile::tempdir().unwrap();
    let export_dir = dir.path().join("dump");

    export_data(&source, &export_dir).await.unwrap();
    assert!(export_dir.join(CATEGORIES_FILE).exists());
    assert!(export_dir.join(QUESTIONS_FILE).exists());

    let target = test_pool().await;
    import_data(&target, &export_dir).await.unwrap();

    assert_eq!(
        get_all_categories(&target).await.unwrap(),
        get_all_categories(&source).await.unwrap()
    );
    assert_eq!(
        get_all_questions(&target).await.unwrap(),
        get_all_questions(&source).await.unwrap()
    );
}

#[tokio::test]
async fn import_overwrites_existing_ids() {
    let pool = test_pool().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(CATEGORIES_FILE),
        "id,type\n1,Natural Science\n7,Music\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join(QUESTIONS_FILE),
        "id,question,answer,difficulty,category\n1,Who wrote Bolero?,Ravel,2,7\n",
    )
    .unwrap();

    import_data(&pool, dir.path()).await.unwrap();

    let categories = get_all_categories(&pool).await.unwrap();
    assert_eq!(categories.len(), 7);
    assert_eq!(categories[0].kind, "Natural Science");
    assert_eq!(categories[6].kind, "Music");
    let questions = get_all_questions(&pool).await.unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].category, 7);
}

#[tokio::test]
async fn import_fails_without_files() {
    let pool = test_pool().await;
    let dir = tempfile::tempdir().unwrap();
    assert!(import_data(&pool, dir.path()).await.is_err());
}

#[tokio::test]
async fn failed_import_changes_nothing() {
    let pool = test_pool().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(CATEGORIES_FILE), "id,type\n1,Renamed\n").unwrap();
    std::fs::write(
        dir.path().join(QUESTIONS_FILE),
        "id,question,answer,difficulty,category\n1,Orphan?,Nobody,1,999\n",
    )
    .unwrap();

    assert!(import_data(&pool, dir.path()).await.is_err());

    let categories = get_all_categories(&pool).await.unwrap();
    assert_eq!(categories[0].kind, "Science");
    assert!(get_all_questions(&pool).await.unwrap().is_empty());
}

#[tokio::test]
async fn imported_questions_are_searchable() {
    let pool = test_pool().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(CATEGORIES_FILE), "id,type\n1,Science\n").unwrap();
    std::fs::write(
        dir.path().join(QUESTIONS_FILE),
        "id,question,answer,difficulty,category\n5,Qu'est-ce que l'ÉNERGIE?,E=mc2,3,1\n",
    )
    .unwrap();

    import_data(&pool, dir.path()).await.unwrap();

    let filter = QuestionFilter {
        category: None,
        search: Some("énergie".to_owned()),
    };
    let found = get_questions(&pool, &filter, 10, 0).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, 5);
}
