use clap::Parser;
use opencollab::auth::password::{hash_password, validate_password_strength};
use std::process::ExitCode;

/// Generate the argon2 hash stored as ADMIN_PASSWORD_HASH
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// New interviewer password
    password: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let Some(password) = args.password else {
        println!("❌ Please provide a password as an argument");
        println!("Usage: generate-password-hash \"YourPassword123!\"");
        return ExitCode::FAILURE;
    };
    if let Err(message) = validate_password_strength(&password) {
        println!("❌ {}", message);
        return ExitCode::FAILURE;
    }

    println!("🔐 Generating secure hash for password...\n");
    match hash_password(&password) {
        Ok(hash) => {
            println!("✅ Password hash generated successfully!\n");
            println!("========================================");
            println!("ADMIN_PASSWORD_HASH:");
            println!("{}", hash);
            println!("========================================\n");
            println!("Set ADMIN_PASSWORD_HASH (and ADMIN_EMAIL) in the server environment and restart it.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error generating hash: {}", e);
            ExitCode::FAILURE
        }
    }
}
