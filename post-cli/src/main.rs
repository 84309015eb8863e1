use clap::Parser;
use post_client::{Post, PostChanges, PostClientHttp};
use serde_json::json;

#[derive(Parser, Debug)]
struct Cli {
    #[clap(short, long)]
    server: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    Register {
        #[clap(long)]
        username: String,
        #[clap(long)]
        email: String,
        #[clap(long)]
        password: String,
    },
    Login {
        #[clap(long)]
        email: String,
        #[clap(long)]
        password: String,
    },
    Logout,
    Profile,
    ListPosts {
        #[clap(long)]
        page: Option<usize>,
        #[clap(long)]
        limit: Option<usize>,
        #[clap(long)]
        status: Option<String>,
        #[clap(long)]
        search: Option<String>,
    },
    GetPost {
        id: u64,
    },
    CreatePost {
        #[clap(long)]
        title: String,
        #[clap(long)]
        content: String,
        #[clap(long = "hashtag")]
        hashtags: Vec<String>,
    },
    UpdatePost {
        id: u64,
        #[clap(long)]
        title: Option<String>,
        #[clap(long)]
        content: Option<String>,
        #[clap(long)]
        status: Option<String>,
    },
    DeletePost {
        id: u64,
    },
    Publish {
        id: u64,
    },
    Stats,
    Generate {
        topic: String,
        #[clap(long)]
        audience: Option<String>,
        #[clap(long)]
        tone: Option<String>,
        #[clap(long)]
        max_length: Option<u32>,
        #[clap(long)]
        image: bool,
        /// Store the result as a draft
        #[clap(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let endpoint = args.server.as_deref().unwrap_or("http://127.0.0.1:8080");
    let mut client = PostClientHttp::connect(endpoint)?;

    match args.command {
        Command::Register {
            username,
            email,
            password,
        } => {
            let user = client.register(username, email, password).await?;
            println!("Registered {} (id {})", user.username, user.id);
        }
        Command::Login { email, password } => {
            let user = client.login(email, password).await?;
            println!("Logged in as {}", user.username);
        }
        Command::Logout => {
            client.logout().await?;
            println!("Logged out");
        }
        Command::Profile => {
            let user = client.profile().await?;
            println!("{} <{}> (id {})", user.username, user.email, user.id);
        }
        Command::ListPosts {
            page,
            limit,
            status,
            search,
        } => {
            let page = client.list_posts(page, limit, status, search).await?;
            println!(
                "Posts {} of {} (page {}/{})",
                page.posts.len(),
                page.pagination.total,
                page.pagination.current_page,
                page.pagination.pages
            );
            for post in page.posts {
                println!("- {}", post);
            }
        }
        Command::GetPost { id } => {
            let post = client.get_post(id).await?;
            println!("{}", post);
            println!("{}", post.content);
            if !post.hashtags.is_empty() {
                println!("{}", post.hashtags.join(" "));
            }
            for (metric, value) in &post.engagement_stats {
                println!("  {metric}: {value}");
            }
        }
        Command::CreatePost {
            title,
            content,
            hashtags,
        } => {
            let post = client.create_post(title, content, hashtags).await?;
            println!("Post created! ID: {}", post.id);
        }
        Command::UpdatePost {
            id,
            title,
            content,
            status,
        } => {
            let changes = PostChanges {
                title,
                content,
                status,
                hashtags: None,
            };
            let post = client.update_post(id, &changes).await?;
            println!("Post updated: {}", post)
        }
        Command::DeletePost { id } => {
            client.delete_post(id).await?;
            println!("Post deleted!")
        }
        Command::Publish { id } => {
            let post = client.publish_post(id).await?;
            println!("{}", published_line(&post));
        }
        Command::Stats => {
            let stats = client.stats().await?;
            println!("total:      {}", stats.total_posts);
            println!("published:  {}", stats.published_posts);
            println!("drafts:     {}", stats.draft_posts);
            println!("scheduled:  {}", stats.scheduled_posts);
            println!("failed:     {}", stats.failed_posts);
            println!("today:      {}", stats.today_posts);
            println!("engagement: {}", stats.total_engagement);
        }
        Command::Generate {
            topic,
            audience,
            tone,
            max_length,
            image,
            save,
        } => {
            let mut request = json!({ "topic": topic, "generate_image": image });
            if let Some(audience) = audience {
                request["target_audience"] = json!(audience);
            }
            if let Some(tone) = tone {
                request["tone"] = json!(tone);
            }
            if let Some(max_length) = max_length {
                request["max_length"] = json!(max_length);
            }

            let response = client.generate(request, save).await?;
            let generated = response.generated;
            println!("{}\n\n{}\n", generated.title, generated.content);
            println!("{}", generated.hashtags.join(" "));
            for tip in &generated.optimization_tips {
                println!("* {tip}");
            }
            if let Some(url) = &generated.image_url {
                println!("image: {url}");
            }
            for err in &generated.generation_metadata.errors {
                eprintln!("warning: {err}");
            }
            if let Some(post) = response.post {
                println!("Saved as {}", post);
            }
        }
    }

    Ok(())
}

fn published_line(post: &Post) -> String {
    format!(
        "Published: {} ({})",
        post,
        post.facebook_post_id.as_deref().unwrap_or("no external id")
    )
}
