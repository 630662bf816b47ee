use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use prettytable::{Cell, Row, Table};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use songboard::models::{
    AccountResponse, Difficulty, SongListResponse, SongSuggestion, SortOrder, SuggestionRequest,
    VoteRequest, VoteResponse, GENRES,
};
use songboard::stats::Statistics;
use songboard::user_models::{
    ChangePasswordRequest, CreateUserRequest, LoginRequest, LoginResponse, ResetPasswordRequest,
    Role, UserListResponse, UserSummary,
};
use std::fs;
use std::path::Path;

const SESSION_FILE: &str = ".songboard-session";

#[derive(Parser)]
#[command(name = "songboard")]
#[command(about = "Suggest, browse and vote on songs for the group", long_about = None)]
struct Cli {
    #[arg(long, global = true, default_value = "http://localhost:3000", env = "SONGBOARD_URL")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Log in to your account")]
    Login {
        #[arg(short, long, help = "Username")]
        username: String,

        #[arg(short, long, help = "Password")]
        password: String,
    },

    #[command(about = "Log out of your account")]
    Logout,

    #[command(about = "Show your account and your suggestions")]
    Whoami,

    #[command(about = "Suggest a new song")]
    Suggest {
        #[arg(short, long, help = "YouTube URL")]
        url: String,

        #[arg(short, long, default_value = "", help = "Song title (defaults to one derived from the video)")]
        title: String,

        #[arg(short, long, default_value = "", help = "Artist")]
        artist: String,

        #[arg(short, long, help = "Genre, e.g. Rock, Pop, Metal, Jazz, Electrónica, Folk, Otro")]
        genre: String,

        #[arg(short, long, help = "easy, medium, hard or very_hard")]
        difficulty: Difficulty,

        #[arg(short, long, default_value = "", help = "Additional notes")]
        notes: String,
    },

    #[command(about = "List suggested songs")]
    List {
        #[arg(short, long, help = "Genres to show (comma-separated)")]
        genre: Option<String>,

        #[arg(short, long, help = "Difficulties to show (comma-separated)")]
        difficulty: Option<String>,

        #[arg(short, long, help = "Only songs suggested by these people (comma-separated)")]
        by: Option<String>,

        #[arg(short, long, default_value = "newest", help = "newest, oldest, most_voted or title")]
        sort: SortOrder,
    },

    #[command(about = "Like a song")]
    Vote {
        #[arg(help = "YouTube video id")]
        video_id: String,
    },

    #[command(about = "Take back your like")]
    Unvote {
        #[arg(help = "YouTube video id")]
        video_id: String,
    },

    #[command(about = "Show statistics")]
    Stats,

    #[command(about = "Change your password")]
    Password {
        #[arg(short, long, help = "Current password")]
        current: String,

        #[arg(short, long, help = "New password")]
        new: String,

        #[arg(short = 'f', long, help = "New password again")]
        confirm: String,
    },

    #[command(about = "List registered users (admin)")]
    Users,

    #[command(about = "Register a new user (admin)")]
    AddUser {
        #[arg(short, long, help = "Username")]
        username: String,

        #[arg(short, long, help = "Password")]
        password: String,

        #[arg(short, long, help = "Full name")]
        name: String,

        #[arg(short, long, default_value = "miembro", help = "miembro or admin")]
        role: Role,
    },

    #[command(about = "Reset a user's password (admin)")]
    ResetPassword {
        #[arg(short, long, help = "Username")]
        username: String,

        #[arg(short, long, help = "New password")]
        password: String,

        #[arg(short = 'f', long, help = "New password again")]
        confirm: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct Session {
    token: String,
    username: String,
    display_name: String,
}

impl Session {
    fn save(&self) -> Result<()> {
        let json = serde_json::to_string(self)?;
        fs::write(SESSION_FILE, json)?;
        Ok(())
    }

    fn load() -> Option<Self> {
        if Path::new(SESSION_FILE).exists() {
            let data = fs::read_to_string(SESSION_FILE).ok()?;
            serde_json::from_str(&data).ok()
        } else {
            None
        }
    }

    fn clear() -> Result<()> {
        if Path::new(SESSION_FILE).exists() {
            fs::remove_file(SESSION_FILE)?;
        }
        Ok(())
    }
}

struct Api {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl Api {
    fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Session::load().map(|s| s.token),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.check(builder).await?;
        response.json().await.context("Failed to parse response")
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        self.check(builder).await?;
        Ok(())
    }

    async fn check(&self, builder: RequestBuilder) -> Result<reqwest::Response> {
        let response = builder
            .send()
            .await
            .context("Failed to connect to the song board. Is the server running?")?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            bail!("{}", error_text);
        }
        Ok(response)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run_command(Api::new(cli.server), cli.command).await {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_command(api: Api, command: Commands) -> Result<()> {
    match command {
        Commands::Login { username, password } => login(&api, username, password).await,
        Commands::Logout => logout(&api).await,
        Commands::Whoami => whoami(&api).await,
        Commands::Suggest {
            url,
            title,
            artist,
            genre,
            difficulty,
            notes,
        } => {
            require_login()?;
            let request = SuggestionRequest {
                url,
                title,
                artist,
                genre,
                difficulty,
                notes,
            };
            suggest(&api, request).await
        }
        Commands::List {
            genre,
            difficulty,
            by,
            sort,
        } => {
            require_login()?;
            list_songs(&api, genre, difficulty, by, sort).await
        }
        Commands::Vote { video_id } => {
            require_login()?;
            vote(&api, video_id, true).await
        }
        Commands::Unvote { video_id } => {
            require_login()?;
            vote(&api, video_id, false).await
        }
        Commands::Stats => {
            require_login()?;
            stats(&api).await
        }
        Commands::Password {
            current,
            new,
            confirm,
        } => {
            require_login()?;
            let request = ChangePasswordRequest {
                current_password: current,
                new_password: new,
                confirm_password: confirm,
            };
            api.send_empty(api.request(Method::POST, "/me/password").json(&request))
                .await?;
            println!("✅ Password changed successfully!");
            Ok(())
        }
        Commands::Users => {
            require_login()?;
            list_users(&api).await
        }
        Commands::AddUser {
            username,
            password,
            name,
            role,
        } => {
            require_login()?;
            let request = CreateUserRequest {
                username,
                password,
                display_name: name,
                role,
            };
            let user: UserSummary = api
                .send(api.request(Method::POST, "/admin/users").json(&request))
                .await?;
            println!("✅ User {} registered as {}", user.username, user.role.as_str());
            Ok(())
        }
        Commands::ResetPassword {
            username,
            password,
            confirm,
        } => {
            require_login()?;
            let request = ResetPasswordRequest {
                new_password: password,
                confirm_password: confirm,
            };
            let path = format!("/admin/users/{}/password", username);
            api.send_empty(api.request(Method::POST, &path).json(&request))
                .await?;
            println!("✅ Password for {} has been reset", username);
            Ok(())
        }
    }
}

async fn login(api: &Api, username: String, password: String) -> Result<()> {
    let request = LoginRequest { username, password };
    let response: LoginResponse = api
        .send(api.request(Method::POST, "/login").json(&request))
        .await?;

    let session = Session {
        token: response.token,
        username: response.user.username.clone(),
        display_name: response.user.display_name.clone(),
    };
    session.save()?;

    println!("✅ Login successful!");
    println!("👤 Welcome, {}!", response.user.display_name);
    Ok(())
}

async fn logout(api: &Api) -> Result<()> {
    if api.token.is_some() {
        // The local session is cleared even if the server is unreachable.
        let _ = api.send_empty(api.request(Method::POST, "/logout")).await;
    }
    Session::clear()?;
    println!("✅ Logged out successfully!");
    Ok(())
}

fn require_login() -> Result<Session> {
    Session::load()
        .ok_or_else(|| anyhow::anyhow!("You must be logged in. Use: songboard login -u <username> -p <password>"))
}

async fn whoami(api: &Api) -> Result<()> {
    if Session::load().is_none() {
        println!("❌ Not logged in");
        println!("💡 Use 'songboard login -u <username> -p <password>' to log in");
        return Ok(());
    }

    let account: AccountResponse = api.send(api.request(Method::GET, "/me")).await?;
    println!("👤 User: {}", account.user.username);
    println!("📛 Name: {}", account.user.display_name);
    println!("🎖️  Role: {}", account.user.role.as_str());

    if account.suggestions.is_empty() {
        println!("\n📭 You have not suggested any songs yet.");
    } else {
        println!("\n🎵 You have suggested {} song(s):\n", account.suggestions.len());
        print_songs(&account.suggestions);
    }
    Ok(())
}

async fn suggest(api: &Api, request: SuggestionRequest) -> Result<()> {
    if !GENRES.contains(&request.genre.as_str()) {
        println!("ℹ️  '{}' is not one of the usual genres: {}", request.genre, GENRES.join(", "));
    }

    let song: SongSuggestion = api
        .send(api.request(Method::POST, "/songs").json(&request))
        .await?;

    println!("✅ Suggestion added!");
    println!("🎵 {} - {}", song.title, song.artist);
    println!("🆔 Video ID: {}", song.video_id);
    Ok(())
}

async fn list_songs(
    api: &Api,
    genre: Option<String>,
    difficulty: Option<String>,
    by: Option<String>,
    sort: SortOrder,
) -> Result<()> {
    let mut query: Vec<(&str, String)> = Vec::new();
    if let Some(genre) = genre {
        query.push(("genre", genre));
    }
    if let Some(difficulty) = difficulty {
        query.push(("difficulty", difficulty));
    }
    if let Some(by) = by {
        query.push(("suggested_by", by));
    }
    query.push((
        "sort",
        serde_json::to_value(sort)?
            .as_str()
            .unwrap_or("newest")
            .to_string(),
    ));

    let result: SongListResponse = api
        .send(api.request(Method::GET, "/songs").query(&query))
        .await?;

    if result.songs.is_empty() {
        println!("📭 No suggestions found.");
        return Ok(());
    }

    println!("\n🎵 Showing {} suggestion(s)\n", result.songs.len());

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("ID"),
        Cell::new("Title"),
        Cell::new("Artist"),
        Cell::new("Genre"),
        Cell::new("Difficulty"),
        Cell::new("Suggested by"),
        Cell::new("Date"),
        Cell::new("Likes"),
    ]));

    for view in result.songs {
        let likes = if view.voted {
            format!("{} 👍 (you)", view.song.vote_count)
        } else {
            view.song.vote_count.to_string()
        };
        table.add_row(Row::new(vec![
            Cell::new(&view.song.video_id),
            Cell::new(&view.song.title),
            Cell::new(&view.song.artist),
            Cell::new(&view.song.genre),
            Cell::new(view.song.difficulty.label()),
            Cell::new(&view.song.suggested_by),
            Cell::new(&view.song.suggestion_date.to_string()),
            Cell::new(&likes),
        ]));
    }

    table.printstd();
    println!();
    Ok(())
}

async fn vote(api: &Api, video_id: String, value: bool) -> Result<()> {
    let path = format!("/songs/{}/vote", video_id);
    let result: VoteResponse = api
        .send(api.request(Method::POST, &path).json(&VoteRequest { value }))
        .await?;

    if result.voted {
        println!("👍 You like {} ({} like(s))", result.video_id, result.vote_count);
    } else {
        println!("👎 Like removed from {} ({} like(s))", result.video_id, result.vote_count);
    }
    Ok(())
}

async fn stats(api: &Api) -> Result<()> {
    let stats: Statistics = api.send(api.request(Method::GET, "/stats")).await?;

    if stats.total_songs == 0 {
        println!("📭 Not enough data for statistics yet.");
        return Ok(());
    }

    println!("\n📊 {} suggestion(s)\n", stats.total_songs);

    println!("Songs by genre");
    let mut table = Table::new();
    for entry in &stats.by_genre {
        table.add_row(Row::new(vec![Cell::new(&entry.label), Cell::new(&entry.count.to_string())]));
    }
    table.printstd();

    println!("\nSongs by difficulty");
    let mut table = Table::new();
    for entry in &stats.by_difficulty {
        table.add_row(Row::new(vec![Cell::new(&entry.label), Cell::new(&entry.count.to_string())]));
    }
    table.printstd();

    println!("\nMost liked");
    let mut table = Table::new();
    table.add_row(Row::new(vec![Cell::new("Song"), Cell::new("Artist"), Cell::new("Likes")]));
    for song in &stats.top_songs {
        table.add_row(Row::new(vec![
            Cell::new(&song.title),
            Cell::new(&song.artist),
            Cell::new(&song.vote_count.to_string()),
        ]));
    }
    table.printstd();

    println!("\nTop contributors");
    let mut table = Table::new();
    table.add_row(Row::new(vec![Cell::new("Person"), Cell::new("Songs suggested")]));
    for entry in &stats.top_contributors {
        table.add_row(Row::new(vec![Cell::new(&entry.label), Cell::new(&entry.count.to_string())]));
    }
    table.printstd();

    println!("\nRecent suggestions");
    let mut table = Table::new();
    for song in &stats.recent {
        table.add_row(Row::new(vec![
            Cell::new(&song.suggestion_date.to_string()),
            Cell::new(&song.title),
            Cell::new(&song.artist),
            Cell::new(&song.suggested_by),
        ]));
    }
    table.printstd();
    println!();

    Ok(())
}

async fn list_users(api: &Api) -> Result<()> {
    let result: UserListResponse = api.send(api.request(Method::GET, "/admin/users")).await?;

    let mut table = Table::new();
    table.add_row(Row::new(vec![Cell::new("User"), Cell::new("Name"), Cell::new("Role")]));
    for user in result.users {
        table.add_row(Row::new(vec![
            Cell::new(&user.username),
            Cell::new(&user.display_name),
            Cell::new(user.role.as_str()),
        ]));
    }
    table.printstd();
    Ok(())
}

fn print_songs(songs: &[SongSuggestion]) {
    for (i, song) in songs.iter().enumerate() {
        println!("{}. 🎵 {} - {}", i + 1, song.title, song.artist);
        println!("   🎸 {} | {}", song.genre, song.difficulty);
        println!("   📅 {}", song.suggestion_date);
        println!("   👍 {} like(s)", song.vote_count);
        if !song.notes.is_empty() {
            println!("   📝 {}", song.notes);
        }
        println!("   🔗 https://www.youtube.com/watch?v={}", song.video_id);
        println!();
    }
}
