//! Place one outbound care call from the command line.
//!
//! `care-call --phone +15550100` dials directly; `--weather` goes through the
//! weather trigger instead.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use care_agent_config::{load_settings, Settings};
use care_agent_telephony::{AssumeExtreme, CallDispatcher, CallRequest, WeatherTrigger};

#[derive(Parser, Debug)]
#[command(name = "care-call", version, about = "Place an outbound care check-in call")]
struct Args {
    /// Number to dial (E.164)
    #[arg(long, env = "DEMO_PHONE_NUMBER")]
    phone: String,

    /// Call reason passed to the agent (weather, medication, ...)
    #[arg(long)]
    reason: Option<String>,

    /// Language preference: auto, en or es
    #[arg(long)]
    lang_pref: Option<String>,

    #[arg(long)]
    person_id: Option<String>,

    /// Only call if the weather monitor reports extreme weather
    #[arg(long)]
    weather: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let env = std::env::var("CARE_AGENT_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        },
    };

    init_tracing(&config);

    let person_id = args
        .person_id
        .unwrap_or_else(|| config.dispatch.default_person_id.clone());

    let dispatcher = CallDispatcher::new(config.dispatch.clone())
        .context("failed to build call dispatcher")?;

    if args.weather {
        let trigger = WeatherTrigger::new(Arc::new(dispatcher), Arc::new(AssumeExtreme));
        match trigger
            .trigger_on_extreme_weather(&args.phone, &person_id)
            .await
            .context("weather call failed")?
        {
            Some(placed) => println!("{}", serde_json::to_string_pretty(&placed)?),
            None => println!("No call placed"),
        }
        return Ok(());
    }

    let mut request = CallRequest::new(&args.phone)
        .with_lang_pref(
            args.lang_pref
                .unwrap_or_else(|| config.agent.default_lang_pref.clone()),
        )
        .with_person_id(person_id);
    if let Some(reason) = args.reason {
        request = request.with_reason(reason);
    }

    let placed = dispatcher
        .place_call(&request)
        .await
        .with_context(|| format!("failed to place call to {}", request.phone_number))?;

    println!("{}", serde_json::to_string_pretty(&placed)?);
    Ok(())
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("care_agent={}", level).into()
    });

    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
