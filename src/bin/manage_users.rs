//! CLI tool to bootstrap and manage user accounts.
//!
//! Usage:
//!   cargo run --bin manage-users -- create-admin --username <name> [--password <pw>]
//!   cargo run --bin manage-users -- list
//!   cargo run --bin manage-users -- set-role --username <name> --role <admin|user>

use std::env;

use run_report_lib::auth::password::hash_password;
use run_report_lib::config::Config;
use run_report_lib::db::DbPool;
use run_report_lib::models::Role;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let command = &args[1];
    if matches!(command.as_str(), "help" | "--help" | "-h") {
        print_usage();
        return;
    }

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match DbPool::new(&config.database).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error connecting to database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = pool.run_migrations().await {
        eprintln!("Error running migrations: {}", e);
        std::process::exit(1);
    }

    match command.as_str() {
        "create-admin" => {
            let username = required_arg(&args, "--username");
            // Falls back to the environment so the password stays out of shell history
            let password = flag_value(&args, "--password")
                .or_else(|| env::var("RRS_ADMIN_PASSWORD").ok())
                .unwrap_or_else(|| {
                    eprintln!("Error: --password or RRS_ADMIN_PASSWORD is required");
                    std::process::exit(1);
                });
            create_admin(&pool, &username, &password).await;
        }
        "list" | "ls" => list_users(&pool).await,
        "set-role" => {
            let username = required_arg(&args, "--username");
            let raw_role = required_arg(&args, "--role");
            let Some(role) = Role::parse(&raw_role) else {
                eprintln!("Error: role must be 'admin' or 'user'");
                std::process::exit(1);
            };
            set_role(&pool, &username, role).await;
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            std::process::exit(1);
        }
    }
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn required_arg(args: &[String], flag: &str) -> String {
    flag_value(args, flag).unwrap_or_else(|| {
        eprintln!("Error: {} is required", flag);
        std::process::exit(1);
    })
}

async fn create_admin(pool: &DbPool, username: &str, password: &str) {
    if password.is_empty() {
        eprintln!("Error: password must not be empty");
        std::process::exit(1);
    }

    match pool
        .create_user(username, hash_password(password), Role::Admin)
        .await
    {
        Ok(user) => println!("Admin '{}' created with id {}.", user.username, user.id),
        Err(e) => {
            eprintln!("Error creating admin: {}", e);
            std::process::exit(1);
        }
    }
}

async fn list_users(pool: &DbPool) {
    let users = match pool.list_users().await {
        Ok(u) => u,
        Err(e) => {
            eprintln!("Error listing users: {}", e);
            std::process::exit(1);
        }
    };

    if users.is_empty() {
        println!("No users found.");
        return;
    }

    println!();
    println!("{:<6} {:<32} {:<8} {:<20}", "ID", "USERNAME", "ROLE", "CREATED");
    println!("{}", "-".repeat(68));
    for user in users {
        println!(
            "{:<6} {:<32} {:<8} {:<20}",
            user.id,
            user.username,
            user.role,
            user.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!();
}

async fn set_role(pool: &DbPool, username: &str, role: Role) {
    match pool.set_user_role(username, role).await {
        Ok(user) => println!("User '{}' is now {}.", user.username, user.role),
        Err(e) => {
            eprintln!("Error updating role: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!();
    eprintln!("Usage: manage-users <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  create-admin --username <name> [--password <pw>]   Create an admin account");
    eprintln!("  list, ls                                           List all users");
    eprintln!("  set-role --username <name> --role <admin|user>     Change a user's role");
    eprintln!("  help                                               Show this help");
    eprintln!();
    eprintln!("The password may also be given as RRS_ADMIN_PASSWORD.");
    eprintln!();
}
