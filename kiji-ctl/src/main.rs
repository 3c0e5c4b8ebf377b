use anyhow::Context;
use kiji_api::{AuthToken, NewUser, UserId, Uuid};

#[derive(structopt::StructOpt)]
struct Opt {
    #[structopt(short, long)]
    host: String,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Create a user
    CreateUser {
        /// Username
        username: String,

        /// Name shown next to the user's posts
        display_name: String,

        /// Initial password
        initial_password: String,

        /// Grant the moderator role
        #[structopt(long)]
        moderator: bool,
    },
}

fn admin_token() -> anyhow::Result<AuthToken> {
    let tok =
        std::env::var("ADMIN_TOKEN").context("retrieving ADMIN_TOKEN environment variable")?;
    let tok = Uuid::try_parse(&tok).context("parsing ADMIN_TOKEN as an auth token")?;
    Ok(AuthToken(tok))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = <Opt as structopt::StructOpt>::from_args();

    let client = reqwest::Client::new();

    match opt.cmd {
        Command::CreateUser {
            username,
            display_name,
            initial_password,
            moderator,
        } => {
            let user = NewUser {
                id: UserId(Uuid::new_v4()),
                username,
                display_name,
                initial_password_hash: initial_password,
                is_moderator: moderator,
            };
            user.validate().context("validating the new user")?;
            client
                .post(format!("{}/api/admin/create-user", opt.host))
                .json(&user)
                .bearer_auth(admin_token()?.0)
                .send()
                .await?
                .error_for_status()?;
        }
    }

    Ok(())
}
