use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use skywatch_core::{App, AppError, ConfigError, NetworkError, ReqwestErrorExt, WeatherError};
use skywatch_dashboard::{
    CheckStatus, ClientState, ConnectionMonitor, ConnectionStatus, Dashboard, DashboardOptions,
};
use skywatch_weather::format::{format_date, format_temperature, format_timestamp, format_wind_speed};
use skywatch_weather::{find_city, ApiError, DailySummary, WeatherApi, WeatherClient, CITIES};

#[derive(Parser, Debug)]
#[command(name = "skywatch")]
#[command(about = "Follow current weather, trends and alerts from a SkyWatch backend")]
#[command(version)]
struct Cli {
    /// Backend URL (overrides config and SKYWATCH_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every dashboard update for a city until Ctrl-C
    Watch {
        /// City to follow (defaults to the configured city)
        #[arg(long, short)]
        city: Option<String>,
    },
    /// Resolve an alert and print the city's remaining alerts
    Resolve {
        alert_id: String,

        /// City whose alert list is reloaded afterwards
        #[arg(long, short)]
        city: Option<String>,
    },
    /// Check the backend and each dashboard endpoint
    Health,
    /// List the monitored cities
    Cities,
}

#[tokio::main]
async fn main() -> Result<()> {
    skywatch_core::init()?;
    let cli = Cli::parse();

    let mut app = App::new()?;
    let config = app.config();
    for warning in app.warnings() {
        eprintln!("warning: {}", warning);
    }

    let base_url = cli.api_url.as_deref().unwrap_or(&config.api.base_url);
    let client = WeatherClient::new(base_url, config.api.timeout()).map_err(app_error)?;
    let options = DashboardOptions {
        refresh_interval: config.dashboard.refresh_interval(),
        summary_days: config.dashboard.summary_days,
    };

    match cli.command {
        Command::Watch { city } => {
            let city = resolve_city(city.as_deref().unwrap_or(&config.dashboard.default_city))?;
            let monitor = ConnectionMonitor::new(client.health());
            monitor.start(config.dashboard.health_check_interval());

            let api: Arc<dyn WeatherApi> = Arc::new(client);
            let dashboard = Dashboard::new(api, options);
            watch(&dashboard, &monitor, &city).await;

            dashboard.deactivate();
            monitor.stop();
        }
        Command::Resolve { alert_id, city } => {
            let city = resolve_city(city.as_deref().unwrap_or(&config.dashboard.default_city))?;
            let api: Arc<dyn WeatherApi> = Arc::new(client);
            let dashboard = Dashboard::new(api, options);
            if let Err(e) = dashboard.activate(&city).await {
                tracing::error!("Initial refresh for {} did not complete: {}", city, e);
            }

            if let Err(e) = dashboard.resolve_alert(&alert_id).await {
                let err = resolve_error(&alert_id, e);
                eprintln!("{}", err.user_message());
                return Err(err.into());
            }
            println!("Resolved alert {}", alert_id);
            print_alerts(&dashboard.snapshot());
        }
        Command::Health => {
            let monitor = ConnectionMonitor::new(client.health());
            let status = monitor.check().await;
            print_connection(&status);
        }
        Command::Cities => {
            for city in CITIES {
                println!("{:<12} {}", city.name, city.id);
            }
        }
    }

    app.shutdown()?;
    Ok(())
}

async fn watch(dashboard: &Dashboard, monitor: &ConnectionMonitor, city: &str) {
    let mut states = dashboard.subscribe();
    let mut connection = monitor.subscribe();
    // The first cycle reports through the state channel.
    drop(dashboard.activate(city));
    tracing::info!(
        "Watching {} (refresh every {}s, {} summary days)",
        dashboard.city().as_deref().unwrap_or(city),
        dashboard.options().refresh_interval.as_secs(),
        dashboard.options().summary_days
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping");
                break;
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                print_state(&state);
            }
            changed = connection.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = connection.borrow_and_update().clone();
                if !status
                    .services()
                    .iter()
                    .any(|(_, check)| check.status == CheckStatus::Checking)
                {
                    print_connection(&status);
                }
            }
        }
    }
}

fn resolve_city(name: &str) -> Result<String, AppError> {
    find_city(name)
        .map(|city| city.name.to_string())
        .ok_or_else(|| WeatherError::UnknownCity(name.to_string()).into())
}

fn app_error(e: ApiError) -> AppError {
    match e {
        ApiError::Network(e) => e.into_network_error().into(),
        ApiError::Status { status: 503, .. } => WeatherError::ServiceUnavailable.into(),
        ApiError::Status { status, message } => NetworkError::ServerError { status, message }.into(),
        ApiError::Decode { message, .. } => NetworkError::InvalidResponse(message).into(),
        ApiError::InvalidUrl(e) => ConfigError::Invalid(format!("api.base_url: {}", e)).into(),
    }
}

fn resolve_error(alert_id: &str, e: ApiError) -> AppError {
    match e.status() {
        Some(404) => WeatherError::AlertNotFound(alert_id.to_string()).into(),
        _ if e.is_transport() => app_error(e),
        _ => WeatherError::ResolveFailed {
            alert_id: alert_id.to_string(),
            reason: e.to_string(),
        }
        .into(),
    }
}

fn print_state(state: &ClientState) {
    let city = state.city.as_deref().unwrap_or("-");
    if state.loading {
        println!("[{}] loading...", city);
        return;
    }
    if let Some(error) = &state.error {
        println!("[{}] {}", city, error);
        return;
    }

    println!("== {} ==", city);
    match &state.current_weather {
        Some(reading) => {
            println!(
                "  {} (feels like {}), {}",
                format_temperature(reading.temperature),
                format_temperature(reading.feels_like),
                reading.weather_condition
            );
            if let Some(humidity) = reading.humidity {
                println!("  humidity {:.0}%", humidity);
            }
            if let Some(wind) = reading.wind_speed {
                println!("  wind {}", format_wind_speed(wind));
            }
            println!("  observed {}", format_timestamp(&reading.timestamp));
        }
        None => println!("  No current weather data available"),
    }

    match state.today_summary() {
        Some(day) => println!(
            "  {}: avg {}, max {}, min {}",
            format_date(&day.date),
            format_temperature(day.avg_temp),
            format_temperature(day.max_temp),
            format_temperature(day.min_temp)
        ),
        None => println!("  No summary data available"),
    }
    if state.historical_data.len() > 1 {
        let trend: Vec<String> = state
            .historical_data
            .iter()
            .map(trend_label)
            .collect();
        println!("  trend (avg °C): {}", trend.join(" "));
    }

    print_alerts(state);
}

fn trend_label(day: &DailySummary) -> String {
    match day.day() {
        Some(date) => format!("{} {:.0}", date.format("%a"), day.avg_temp),
        None => format!("{:.0}", day.avg_temp),
    }
}

fn print_alerts(state: &ClientState) {
    if state.alerts.is_empty() {
        println!("  No active alerts");
        return;
    }
    for alert in &state.alerts {
        println!(
            "  [{}] #{} {}: {} ({})",
            alert.severity,
            alert.alert_id,
            alert.alert_type,
            alert.message,
            format_timestamp(&alert.timestamp)
        );
    }
}

fn print_connection(status: &ConnectionStatus) {
    for (name, check) in status.services() {
        let checked = check
            .last_checked
            .map(|ts| ts.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string());
        match &check.error {
            Some(error) => println!("{:<8} {:<10} {} ({})", name, check.status.label(), checked, error),
            None => println!("{:<8} {:<10} {}", name, check.status.label(), checked),
        }
    }
}
