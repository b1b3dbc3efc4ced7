// Provision a resource owner for the password grant.
//
// Usage: create_user <username> <password>
//
// Storage is selected the same way as the server (application.conf / OAUTH2_* env vars).

use std::io;

use oauth2_config::Config;
use oauth2_core::User;
use oauth2_ports::Storage;

fn to_io(e: impl std::fmt::Display) -> io::Error {
    io::Error::other(e.to_string())
}

#[actix_rt::main]
async fn main() -> io::Result<()> {
    let mut args = std::env::args().skip(1);
    let (username, password) = match (args.next(), args.next(), args.next()) {
        (Some(u), Some(p), None) if !u.trim().is_empty() && !p.is_empty() => (u, p),
        _ => {
            eprintln!("usage: create_user <username> <password>");
            std::process::exit(2);
        }
    };

    let config = Config::default();
    let storage = oauth2_server::build_storage(&config.database.url)
        .await
        .map_err(to_io)?;

    let user = User::with_password(username.trim().to_string(), &password).map_err(to_io)?;
    storage.save_user(&user).await.map_err(to_io)?;

    println!("created user {} ({})", user.username, user.id);
    Ok(())
}
