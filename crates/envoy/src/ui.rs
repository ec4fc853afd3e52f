use crate::client::ApiClient;
use anyhow::Result;
use std::io::{self, Write};

pub async fn single_message(client: ApiClient, assistant_id: &str, message: String) -> Result<()> {
    let response = client.chat(assistant_id, None, message).await?;
    println!("{}", response.message);
    Ok(())
}

pub async fn interactive_chat(client: ApiClient, assistant_id: &str) -> Result<()> {
    println!("Envoy chat with {} started. Type 'quit' to exit.\n", assistant_id);

    let mut thread_id: Option<String> = None;

    loop {
        print!("You: ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.eq_ignore_ascii_case("quit") {
            println!("Goodbye!");
            break;
        }

        if input.is_empty() {
            continue;
        }

        match client
            .chat(assistant_id, thread_id.clone(), input.to_string())
            .await
        {
            Ok(response) => {
                println!("\nAssistant: {}\n", response.message);
                thread_id = Some(response.thread_id);
            }
            Err(e) => {
                eprintln!("Error: {}\n", e);
            }
        }
    }

    Ok(())
}

/// Ask for a secret on the terminal without echoing it.
pub fn prompt_password(label: &str) -> Result<String> {
    let password = dialoguer::Password::new().with_prompt(label).interact()?;
    Ok(password)
}
