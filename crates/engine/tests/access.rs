use std::sync::atomic::{AtomicUsize, Ordering};

use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use engine::{AdminAction, Engine, EngineError, ExpenseDraft};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    // A named shared-cache in-memory DB with a multi-connection pool:
    // sea-orm caps unnamed sqlite::memory: pools at one connection, which
    // deadlocks operations that hold a transaction while reading through
    // the admin store. The counter keeps each test on its own database.
    static DB_ID: AtomicUsize = AtomicUsize::new(0);
    let id = DB_ID.fetch_add(1, Ordering::Relaxed);
    let mut opts = ConnectOptions::new(format!(
        "sqlite:file:access_test_{id}?mode=memory&cache=shared"
    ));
    opts.max_connections(4);
    let db = Database::connect(opts).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build().unwrap();
    (engine, db)
}

async fn new_user(engine: &Engine, email: &str) -> (String, String) {
    let (user, token) = engine
        .admin_store()
        .create_identity(email, None, false)
        .await
        .unwrap();
    (user.id, token)
}

async fn new_admin(engine: &Engine, email: &str) -> (String, String) {
    let (user, token) = engine
        .admin_store()
        .create_identity(email, Some("Admin"), true)
        .await
        .unwrap();
    (user.id, token)
}

fn draft(item: &str, price: f64) -> ExpenseDraft {
    ExpenseDraft {
        item: item.to_string(),
        price,
        ..Default::default()
    }
}

#[tokio::test]
async fn resolve_caller_accepts_known_token() {
    let (engine, _db) = engine_with_db().await;
    let (alice_id, token) = new_user(&engine, "alice@example.com").await;

    let caller = engine.resolve_caller(&token).await.unwrap();
    assert_eq!(caller.id, alice_id);
    assert_eq!(caller.email, "alice@example.com");
}

#[tokio::test]
async fn resolve_caller_rejects_unknown_and_empty_tokens() {
    let (engine, _db) = engine_with_db().await;

    let err = engine.resolve_caller("nope").await.unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized(_)));

    let err = engine.resolve_caller("").await.unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized(_)));
}

#[tokio::test]
async fn blocked_account_is_rejected_with_valid_token() {
    let (engine, _db) = engine_with_db().await;
    let (admin_id, _) = new_admin(&engine, "root@example.com").await;
    let (alice_id, token) = new_user(&engine, "alice@example.com").await;

    // Token works before the block.
    engine.resolve_caller(&token).await.unwrap();

    engine
        .admin_action(&admin_id, &alice_id, AdminAction::Block)
        .await
        .unwrap();

    // The token is still valid at the identity layer, but the profile flag
    // now rejects every protected operation.
    let err = engine.resolve_caller(&token).await.unwrap_err();
    assert_eq!(err, EngineError::Forbidden("account blocked".to_string()));

    engine
        .admin_action(&admin_id, &alice_id, AdminAction::Unblock)
        .await
        .unwrap();
    engine.resolve_caller(&token).await.unwrap();
}

#[tokio::test]
async fn owner_member_and_stranger_access_matrix() {
    let (engine, _db) = engine_with_db().await;
    let (alice_id, _) = new_user(&engine, "alice@example.com").await;
    let (bob_id, _) = new_user(&engine, "bob@example.com").await;
    let (carol_id, _) = new_user(&engine, "carol@example.com").await;

    let wallet = engine.create_wallet("Travel", &alice_id).await.unwrap();
    engine
        .add_member(&wallet.id, "bob@example.com", None, &alice_id)
        .await
        .unwrap();

    // Owner and member can both read and write.
    for user in [&alice_id, &bob_id] {
        engine
            .create_expense(&wallet.id, draft("Tickets", 42.0), user)
            .await
            .unwrap();
        engine
            .list_expenses(&wallet.id, &Default::default(), user)
            .await
            .unwrap();
    }

    // A stranger gets Forbidden on both.
    let err = engine
        .create_expense(&wallet.id, draft("Sneaky", 1.0), &carol_id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine
        .list_expenses(&wallet.id, &Default::default(), &carol_id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn missing_wallet_reads_as_forbidden_not_absent() {
    let (engine, _db) = engine_with_db().await;
    let (alice_id, _) = new_user(&engine, "alice@example.com").await;

    let err = engine
        .list_expenses("no-such-wallet", &Default::default(), &alice_id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn only_owner_can_invite_and_delete() {
    let (engine, _db) = engine_with_db().await;
    let (alice_id, _) = new_user(&engine, "alice@example.com").await;
    let (bob_id, _) = new_user(&engine, "bob@example.com").await;
    let (_carol_id, _) = new_user(&engine, "carol@example.com").await;

    let wallet = engine.create_wallet("Casa", &alice_id).await.unwrap();
    engine
        .add_member(&wallet.id, "bob@example.com", None, &alice_id)
        .await
        .unwrap();

    // A plain member cannot invite.
    let err = engine
        .add_member(&wallet.id, "carol@example.com", None, &bob_id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    // Nor delete the wallet.
    let err = engine.delete_wallet(&wallet.id, &bob_id).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    engine.delete_wallet(&wallet.id, &alice_id).await.unwrap();
}

#[tokio::test]
async fn non_owner_invites_never_reveal_email_registration() {
    let (engine, _db) = engine_with_db().await;
    let (alice_id, _) = new_user(&engine, "alice@example.com").await;
    let (mallory_id, _) = new_user(&engine, "mallory@example.com").await;
    let wallet = engine.create_wallet("Casa", &alice_id).await.unwrap();

    // Registered or not, the target email makes no difference for a
    // non-owner: the ownership check fires before any identity lookup.
    let err = engine
        .add_member(&wallet.id, "ghost@example.com", None, &mallory_id)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Forbidden("only the owner can do this".to_string())
    );

    let err = engine
        .add_member(&wallet.id, "alice@example.com", None, &mallory_id)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Forbidden("only the owner can do this".to_string())
    );
}

#[tokio::test]
async fn inviting_unknown_email_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    let (alice_id, _) = new_user(&engine, "alice@example.com").await;
    let wallet = engine.create_wallet("Casa", &alice_id).await.unwrap();

    let err = engine
        .add_member(&wallet.id, "ghost@example.com", None, &alice_id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn invite_is_idempotent_and_owner_role_is_refused() {
    let (engine, _db) = engine_with_db().await;
    let (alice_id, _) = new_user(&engine, "alice@example.com").await;
    new_user(&engine, "bob@example.com").await;

    let wallet = engine.create_wallet("Casa", &alice_id).await.unwrap();
    engine
        .add_member(&wallet.id, "bob@example.com", Some("member"), &alice_id)
        .await
        .unwrap();
    engine
        .add_member(&wallet.id, "bob@example.com", Some("member"), &alice_id)
        .await
        .unwrap();

    let members = engine.list_members(&wallet.id, &alice_id).await.unwrap();
    assert_eq!(members.len(), 2); // owner + bob

    let err = engine
        .add_member(&wallet.id, "bob@example.com", Some("owner"), &alice_id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidField(_)));
}

#[tokio::test]
async fn deleting_a_wallet_twice_fails_cleanly() {
    let (engine, _db) = engine_with_db().await;
    let (alice_id, _) = new_user(&engine, "alice@example.com").await;

    let wallet = engine.create_wallet("Casa", &alice_id).await.unwrap();
    engine
        .create_expense(&wallet.id, draft("Rent", 700.0), &alice_id)
        .await
        .unwrap();

    engine.delete_wallet(&wallet.id, &alice_id).await.unwrap();
    let err = engine
        .delete_wallet(&wallet.id, &alice_id)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("wallet not exists".to_string()));

    // The cascade also removed it from the listing.
    assert!(engine.list_wallets(&alice_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn admin_checks_gate_moderation() {
    let (engine, _db) = engine_with_db().await;
    let (alice_id, _) = new_user(&engine, "alice@example.com").await;
    let (bob_id, _) = new_user(&engine, "bob@example.com").await;
    let (admin_id, _) = new_admin(&engine, "root@example.com").await;

    let err = engine.list_users(&alice_id).await.unwrap_err();
    assert_eq!(err, EngineError::Forbidden("not admin".to_string()));

    let users = engine.list_users(&admin_id).await.unwrap();
    assert_eq!(users.len(), 3);
    let root = users.iter().find(|u| u.id == admin_id).unwrap();
    assert!(root.is_admin);
    assert_eq!(root.full_name, "Admin");

    // Promotion makes the admin listing available to bob too.
    engine
        .admin_action(&admin_id, &bob_id, AdminAction::Promote)
        .await
        .unwrap();
    engine.list_users(&bob_id).await.unwrap();

    // Admins cannot delete or demote themselves.
    let err = engine
        .admin_action(&admin_id, &admin_id, AdminAction::Delete)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidField(_)));
}

#[tokio::test]
async fn moderating_an_unknown_user_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    let (admin_id, _) = new_admin(&engine, "root@example.com").await;

    for action in [AdminAction::Block, AdminAction::Promote] {
        let err = engine
            .admin_action(&admin_id, "no-such-user", action)
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::KeyNotFound("user not found".to_string()));
    }
}

#[tokio::test]
async fn deleting_a_user_cascades_to_owned_records() {
    let (engine, _db) = engine_with_db().await;
    let (admin_id, _) = new_admin(&engine, "root@example.com").await;
    let (alice_id, _) = new_user(&engine, "alice@example.com").await;
    let (bob_id, _) = new_user(&engine, "bob@example.com").await;

    // Alice owns a wallet bob is a member of; bob also owns his own wallet
    // with an expense from alice in it.
    let alices = engine.create_wallet("Casa", &alice_id).await.unwrap();
    engine
        .add_member(&alices.id, "bob@example.com", None, &alice_id)
        .await
        .unwrap();
    let bobs = engine.create_wallet("Bob", &bob_id).await.unwrap();
    engine
        .add_member(&bobs.id, "alice@example.com", None, &bob_id)
        .await
        .unwrap();
    engine
        .create_expense(&bobs.id, draft("Shared dinner", 30.0), &alice_id)
        .await
        .unwrap();

    engine
        .admin_action(&admin_id, &alice_id, AdminAction::Delete)
        .await
        .unwrap();

    // Alice's wallet is gone, her token no longer resolves, and her expense
    // in bob's wallet was removed with her.
    assert!(engine.list_wallets(&bob_id).await.unwrap().len() == 1);
    let remaining = engine
        .list_expenses(&bobs.id, &Default::default(), &bob_id)
        .await
        .unwrap();
    assert!(remaining.is_empty());
    let users = engine.list_users(&admin_id).await.unwrap();
    assert!(users.iter().all(|u| u.id != alice_id));
}
