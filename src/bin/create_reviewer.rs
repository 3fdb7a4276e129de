use std::env;

use anyhow::{bail, Context, Result};
use diesel::prelude::*;
use uuid::Uuid;

use gatepass::{
    auth::{password, ROLE_ADMIN, ROLE_HR, ROLE_MEDICAL, ROLE_SAFETY},
    config::AppConfig,
    db,
    models::NewReviewer,
    schema::reviewers,
};

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let mut args = env::args().skip(1);
    let (username, pass, role) = match (args.next(), args.next(), args.next()) {
        (Some(u), Some(p), Some(r)) => (u, p, r),
        _ => {
            eprintln!("Usage: create_reviewer <username> <password> <hr|medical|safety|admin>");
            std::process::exit(1);
        }
    };

    if ![ROLE_HR, ROLE_MEDICAL, ROLE_SAFETY, ROLE_ADMIN].contains(&role.as_str()) {
        bail!("role must be one of: hr, medical, safety, admin");
    }

    let config = AppConfig::from_env()?;
    let pool = db::init_pool(&config.database_url, 1)?;
    let mut conn = pool.get().context("failed to get database connection")?;

    let password_hash = password::hash_password(&pass)?;
    let reviewer = NewReviewer {
        id: Uuid::new_v4(),
        username: username.clone(),
        password_hash,
        role,
    };

    diesel::insert_into(reviewers::table)
        .values(&reviewer)
        .on_conflict(reviewers::username)
        .do_update()
        .set(reviewers::password_hash.eq(&reviewer.password_hash))
        .execute(&mut conn)
        .context("failed to upsert reviewer")?;

    println!("reviewer '{username}' ready");
    Ok(())
}
