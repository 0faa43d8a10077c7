//! `georag login` and `georag profile`

use anyhow::{bail, Context, Result};
use clap::Args;
use georag_core::{ChatClient, Config, Quota, UserProfile};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Username, e-mail or phone number
    pub account: String,

    /// Password; read from stdin when omitted
    #[arg(long)]
    pub password: Option<String>,
}

/// Log in and print the bearer token on stdout
///
/// The token is not stored; pass it on via `GEORAG_TOKEN`, `--token` or
/// `[auth] token` in config.toml.
pub async fn login(config: &Config, args: LoginArgs) -> Result<()> {
    let password = match args.password {
        Some(password) => password,
        None => {
            eprint!("Password: ");
            read_password(BufReader::new(tokio::io::stdin())).await?
        }
    };

    let client = ChatClient::from_config(config)?;
    let result = client
        .login(&args.account, &password)
        .await
        .with_context(|| format!("Login failed for {}", args.account))?;

    eprintln!("Logged in as {}", display_name(&result.nickname, &args.account));
    println!("{}", result.token);
    Ok(())
}

/// Show the logged-in user's profile and remaining quota
pub async fn profile(config: &Config) -> Result<()> {
    if config.auth.token.is_none() {
        bail!("No token configured; run `georag login` first");
    }

    let client = ChatClient::from_config(config)?;
    let profile = client.profile().await.context("Failed to load profile")?;
    let quota = client.quota().await.context("Failed to load quota")?;
    print!("{}", format_profile(&profile, &quota));
    Ok(())
}

async fn read_password<R: AsyncBufRead + Unpin>(reader: R) -> Result<String> {
    let line = reader
        .lines()
        .next_line()
        .await
        .context("Failed to read password")?
        .unwrap_or_default();
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("Password is empty");
    }
    Ok(password)
}

fn display_name<'a>(nickname: &'a str, fallback: &'a str) -> &'a str {
    if nickname.trim().is_empty() {
        fallback
    } else {
        nickname
    }
}

fn format_profile(profile: &UserProfile, quota: &Quota) -> String {
    let mut out = format!(
        "{} ({})\n",
        display_name(&profile.nickname, &profile.username),
        profile.username
    );
    let fields = [
        ("email", profile.email.as_deref()),
        ("phone", profile.phone.as_deref()),
        ("region", profile.region.as_deref()),
        ("gender", profile.gender_desc.as_deref()),
        ("status", profile.status_desc.as_deref()),
        ("joined", profile.create_time.as_deref()),
    ];
    for (name, value) in fields {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            out.push_str(&format!("{:<8}{}\n", name, value));
        }
    }
    match &quota.quota_desc {
        Some(desc) if !desc.is_empty() => {
            out.push_str(&format!("{:<8}{} ({})\n", "quota", quota.quota, desc))
        }
        _ => out.push_str(&format!("{:<8}{}\n", "quota", quota.quota)),
    }
    out
}
