/// One-shot commands against the marketplace backend
use cargolink_client::messenger::Messenger;
use cargolink_client::notify;
use cargolink_client::timefmt;
use cargolink_client::Config;
use chrono::Utc;
use colored::*;
use std::io::{BufRead, Write};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let bin = args
        .first()
        .map(|s| s.as_str())
        .unwrap_or("cli")
        .to_string();

    if args.len() < 2 {
        print_usage(&bin);
        return Ok(());
    }

    let config = Config::from_args(&args)?;
    let messenger = Messenger::new(config);
    let command = &args[1];

    match command.as_str() {
        "login" => {
            if args.len() < 3 {
                eprintln!("{}", format!("Usage: {} login <email> [--remember]", bin).yellow());
                return Ok(());
            }
            let email = &args[2];
            let remember = args.iter().any(|a| a == "--remember");
            let password = prompt_password()?;
            match messenger.login(email, &password, remember).await {
                Ok(user) => {
                    println!("{} Logged in as {}", "✓".green().bold(), user.name.cyan());
                }
                Err(e) => fail(&format!("Login failed: {}", e)),
            }
        }
        "logout" => {
            messenger.logout()?;
            println!("{} Logged out", "✓".green().bold());
        }
        "status" => match messenger.current_user().await {
            Ok(user) => {
                let conversations = messenger.api().conversations().await.unwrap_or_default();
                let stats = notify::stats(&conversations);
                println!("{}", "CargoLink".bright_cyan().bold());
                println!("  Logged in as: {}", user.name.cyan());
                println!("  Conversations: {}", stats.active.to_string().green());
                println!("  Unread:        {}", stats.unread.to_string().green());
            }
            Err(e) => fail(&format!("{}", e)),
        },
        "conversations" => match messenger.api().conversations().await {
            Ok(conversations) => {
                if conversations.is_empty() {
                    println!("{}", "No conversations yet".yellow());
                    return Ok(());
                }
                let now = Utc::now();
                println!(
                    "{}",
                    format!("Conversations ({})", conversations.len())
                        .bright_cyan()
                        .bold()
                );
                println!("{}", "─".repeat(60).dimmed());
                for conversation in &conversations {
                    let unread = if conversation.unread_count > 0 {
                        format!(" [{}]", conversation.unread_count).blue().to_string()
                    } else {
                        String::new()
                    };
                    println!(
                        "  {}{} {} {}",
                        conversation.other_user.name.cyan(),
                        unread,
                        notify::list_preview(conversation.last_message.as_deref()).dimmed(),
                        timefmt::humanize_event_time(&conversation.last_message_time, now)
                            .dimmed()
                    );
                }
            }
            Err(e) => fail(&format!("{}", e)),
        },
        "notifications" => match messenger.notifications().await {
            Ok(feed) => {
                if feed.is_empty() {
                    println!("{}", "All caught up!".green());
                    return Ok(());
                }
                let now = Utc::now();
                for notification in &feed {
                    println!(
                        "  {} {} {}",
                        notification.title.cyan().bold(),
                        notification.message,
                        timefmt::humanize_event_time(&notification.time, now).dimmed()
                    );
                }
                println!(
                    "{}",
                    format!("{} unread", notify::total_unread(&feed)).yellow()
                );
            }
            Err(e) => fail(&format!("{}", e)),
        },
        "send" => {
            if args.len() < 4 {
                eprintln!(
                    "{}",
                    format!("Usage: {} send <peer_id> <message>", bin).yellow()
                );
                return Ok(());
            }
            let peer_id = &args[2];
            let message = args[3..].join(" ");
            match messenger.api().send_message(peer_id, message.trim(), None).await {
                Ok(receipt) => match receipt.message_id {
                    Some(id) => {
                        println!("{} Message sent! ID: {}", "✓".green().bold(), id.cyan())
                    }
                    None => println!("{} Message sent!", "✓".green().bold()),
                },
                Err(e) => fail(&format!("{}", e)),
            }
        }
        "mark-read" => {
            if args.len() < 3 {
                eprintln!(
                    "{}",
                    format!("Usage: {} mark-read <conversation_id>", bin).yellow()
                );
                return Ok(());
            }
            match messenger.api().mark_read(&args[2]).await {
                Ok(()) => println!("{} Conversation marked read", "✓".green().bold()),
                Err(e) => fail(&format!("{}", e)),
            }
        }
        _ => {
            eprintln!("{} Unknown command: {}", "✗".red().bold(), command.red());
            print_usage(&bin);
        }
    }

    Ok(())
}

fn fail(message: &str) -> ! {
    eprintln!("{} Error: {}", "✗".red().bold(), message.red());
    std::process::exit(1);
}

fn prompt_password() -> anyhow::Result<String> {
    print!("Password: ");
    std::io::stdout().flush()?;
    let mut password = String::new();
    std::io::stdin().lock().read_line(&mut password)?;
    Ok(password.trim_end_matches(['\r', '\n']).to_string())
}

fn print_usage(bin: &str) {
    println!("{}", "⚡ CargoLink CLI".bright_cyan().bold());
    println!();
    println!("{}", "Usage:".bright_white().bold());
    println!("  {} <command> [args] [--api-url <url>] [--data-dir <path>]", bin.cyan());
    println!();
    println!("{}", "Commands:".bright_white().bold());
    println!("  {} <email> [--remember]    Log in and store the session", "login".cyan());
    println!("  {}                        Drop the stored session", "logout".cyan());
    println!("  {}                        Show identity and unread totals", "status".cyan());
    println!("  {}                 List conversations", "conversations".cyan());
    println!("  {}                 Show the unread notification feed", "notifications".cyan());
    println!("  {} <peer_id> <message>      Send a direct message", "send".cyan());
    println!("  {} <conversation_id>   Mark a conversation read", "mark-read".cyan());
}
