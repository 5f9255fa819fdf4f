//! `MySqlUserStore` against a real MySQL server.
//!
//! Ignored by default. Point `DB_HOST`, `DB_USER`, `DB_PASSWORD` and
//! `DB_NAME` at a scratch database and run
//! `cargo test -p aluforce_core --test mysql_store -- --ignored`.

use aluforce_core::auth::store::{MySqlUserStore, UserStore};
use aluforce_core::db::DbSettings;
use aluforce_core::models::auth::{Module, UserStatus};
use sqlx::MySqlPool;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS usuarios (\
        id INT AUTO_INCREMENT PRIMARY KEY, \
        email VARCHAR(255) NOT NULL, \
        nome VARCHAR(255) NULL, \
        senha_hash VARCHAR(255) NULL, \
        role VARCHAR(64) NULL, \
        status VARCHAR(32) NULL, \
        departamento VARCHAR(128) NULL, \
        is_admin TINYINT(1) NULL DEFAULT 0, \
        senha_temporaria TINYINT(1) NULL DEFAULT 0)",
    "CREATE TABLE IF NOT EXISTS permissoes_modulos (\
        id INT AUTO_INCREMENT PRIMARY KEY, \
        usuario_id INT NOT NULL, \
        modulo VARCHAR(64) NOT NULL, \
        visualizar TINYINT(1) NOT NULL DEFAULT 0, \
        UNIQUE KEY uq_usuario_modulo (usuario_id, modulo))",
];

async fn seed_user(pool: &MySqlPool, email: &str) -> i64 {
    for ddl in SCHEMA {
        sqlx::query(ddl).execute(pool).await.expect("create schema");
    }
    let inserted = sqlx::query(
        "INSERT INTO usuarios \
         (email, nome, senha_hash, role, status, is_admin, senha_temporaria) \
         VALUES (?, 'Teste', '$2b$04$placeholder', 'user', 'ativo', 1, 1)",
    )
    .bind(email)
    .execute(pool)
    .await
    .expect("insert user");
    i64::try_from(inserted.last_insert_id()).expect("id fits i64")
}

async fn cleanup(pool: &MySqlPool, user_id: i64) {
    sqlx::query("DELETE FROM permissoes_modulos WHERE usuario_id = ?")
        .bind(user_id)
        .execute(pool)
        .await
        .expect("delete grants");
    sqlx::query("DELETE FROM usuarios WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await
        .expect("delete user");
}

#[tokio::test]
#[ignore = "needs a MySQL database configured through DB_* variables"]
async fn store_round_trips_against_mysql() {
    let pool = DbSettings::from_env()
        .expect("DB_* settings")
        .connect_lazy();
    let store = MySqlUserStore::new(pool.clone());
    store.ping().await.expect("database reachable");

    let email = format!("store-test-{}@aluforce.test", std::process::id());
    let user_id = seed_user(&pool, &email).await;

    let record = store
        .find_by_email(&email)
        .await
        .expect("lookup")
        .expect("seeded user");
    assert_eq!(record.user.id, user_id);
    assert_eq!(record.user.status, UserStatus::Active);
    assert!(record.user.is_admin);
    assert!(record.temporary_password);
    assert!(store.find_by_id(user_id).await.expect("lookup").is_some());

    // A second grant hits the unique key and must not fail.
    store.grant_module(user_id, Module::Vendas).await.expect("grant");
    store.grant_module(user_id, Module::Vendas).await.expect("grant again");
    assert_eq!(store.granted_modules(user_id).await.expect("list"), vec![Module::Vendas]);
    assert!(store.has_module_grant(user_id, Module::Vendas).await.expect("check"));

    store.revoke_module(user_id, Module::Vendas).await.expect("revoke");
    assert!(!store.has_module_grant(user_id, Module::Vendas).await.expect("check"));
    assert!(store.granted_modules(user_id).await.expect("list").is_empty());

    store.set_status(user_id, UserStatus::Dismissed).await.expect("status");
    store
        .set_password_hash(user_id, "$2b$04$replaced", false)
        .await
        .expect("password");
    let record = store
        .find_by_id(user_id)
        .await
        .expect("lookup")
        .expect("seeded user");
    assert_eq!(record.user.status, UserStatus::Dismissed);
    assert_eq!(record.password_hash.as_deref(), Some("$2b$04$replaced"));
    assert!(!record.temporary_password);

    cleanup(&pool, user_id).await;
}
