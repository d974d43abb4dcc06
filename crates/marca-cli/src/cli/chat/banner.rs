//! Welcome banner for chat sessions.

use console::style;

/// Print the banner shown when the chat loop opens a conversation.
pub fn print_welcome_banner(title: &str, conversation_id: &str, backend: Option<&str>) {
    println!();
    println!("  {} {}", style("*").cyan(), style(title).cyan().bold());
    println!();
    println!(
        "  {}  {}",
        style("Chat:").bold(),
        style(&conversation_id[..8.min(conversation_id.len())]).dim()
    );
    match backend {
        Some(url) => println!("  {}  {}", style("Backend:").bold(), style(url).dim()),
        None => println!(
            "  {}  {}",
            style("Backend:").bold(),
            style("not configured (set MARCA_BACKEND_URL)").yellow()
        ),
    }
    println!();
    println!(
        "  {}",
        style("Type /help for commands, /branding for the questionnaire, Ctrl+D to exit").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}
