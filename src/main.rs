use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use smartplate::api::types::{
    BiologicalSex, DailyActivityLevel, Goal, LogMealRequest, ManualMacros, Meal, MetricsRange,
    NutritionTargets, TrainingIntensity, TrainingType, UserProfile,
};
use smartplate::{App, ApiClient, SessionStore, SmartPlateError, SmartPlateResult};

#[derive(Parser)]
#[command(name = "smartplate", about = "SmartPlate: AI nutrition tracking", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account and start a session
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Authenticate and start a session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Drop the stored session
    Logout,
    /// Show who is currently logged in
    Whoami,
    /// Daily targets and the day's meals
    Dashboard {
        /// Day to show, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Log and inspect meals
    #[command(subcommand)]
    Meal(MealCommand),
    /// Biometric profile driving the target calculation
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Daily nutrition targets
    #[command(subcommand)]
    Targets(TargetsCommand),
    /// Historical aggregates
    #[command(subcommand)]
    History(HistoryCommand),
}

#[derive(Subcommand)]
enum MealCommand {
    /// Log a meal, either from a photo (AI analysis) or with explicit macros
    Log {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Path to a photo; the server estimates the macros
        #[arg(long, conflicts_with_all = ["calories", "protein", "carbs", "fat"])]
        photo: Option<std::path::PathBuf>,
        #[arg(long)]
        calories: Option<f64>,
        #[arg(long)]
        protein: Option<f64>,
        #[arg(long)]
        carbs: Option<f64>,
        #[arg(long)]
        fat: Option<f64>,
        /// Day to log the meal on, YYYY-MM-DD (default: server-side today)
        #[arg(long)]
        date: Option<String>,
    },
    /// List meals for a day
    List {
        #[arg(long)]
        date: Option<String>,
    },
    /// Full detail for one meal, including the AI explanation
    Show { id: String },
    /// Delete a meal by id
    Delete { id: String },
}

#[derive(Subcommand)]
enum ProfileCommand {
    Show,
    /// Save the full profile (all biometric fields required)
    Set {
        #[arg(long)]
        weight_kg: f64,
        #[arg(long)]
        height_cm: f64,
        #[arg(long)]
        age: u32,
        /// male | female
        #[arg(long)]
        sex: String,
        #[arg(long)]
        workouts_per_week: u32,
        /// strength | cardio | crossfit | other
        #[arg(long)]
        training_type: String,
        /// low | moderate | high
        #[arg(long)]
        training_intensity: String,
        /// sedentary | light | moderate | very
        #[arg(long)]
        activity: String,
        /// loss | maintain | gain
        #[arg(long)]
        goal: String,
        /// 1-5
        #[arg(long)]
        sleep_quality: u8,
        /// 1-5
        #[arg(long)]
        stress_level: u8,
        /// 1-5
        #[arg(long)]
        routine_consistency: u8,
        #[arg(long)]
        workout_notes: Option<String>,
        #[arg(long)]
        activity_notes: Option<String>,
    },
}

#[derive(Subcommand)]
enum TargetsCommand {
    Show,
    /// Ask the server to derive targets from the stored profile
    Generate,
    /// Manually override the targets
    Set {
        #[arg(long)]
        calories: f64,
        #[arg(long)]
        protein: f64,
        #[arg(long)]
        carbs: f64,
        #[arg(long)]
        fat: f64,
        #[arg(long)]
        sleep_hours: Option<f64>,
    },
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// Per-day calorie and macro totals
    Meals {
        /// week | month
        #[arg(long, default_value = "week")]
        range: String,
    },
    /// Body-weight entries
    Body {
        #[arg(long, default_value = "week")]
        range: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        if e.is_unauthorized() {
            eprintln!("Not logged in (or the session expired). Run `smartplate login`.");
        } else {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> SmartPlateResult<()> {
    let config = smartplate::config::load_config()?;
    let app = App::new(SessionStore::open_default()?, ApiClient::new(config.api_base()));

    match cli.command {
        Command::Register {
            name,
            email,
            password,
        } => {
            let session = app.register(&name, &email, &password).await?;
            println!("Welcome, {} <{}>", session.name, session.email);
        }
        Command::Login { email, password } => {
            let session = app.login(&email, &password).await?;
            println!("Logged in as {} <{}>", session.name, session.email);
        }
        Command::Logout => {
            app.logout();
            println!("Logged out.");
        }
        Command::Whoami => match app.session() {
            Some(s) => println!("{} <{}>", s.name, s.email),
            None => println!("Not logged in."),
        },
        Command::Dashboard { date } => {
            let date = parse_date_or_today(date.as_deref())?;
            let dash = app.dashboard(date).await?;
            print_targets(&dash.targets);
            let eaten: f64 = dash.meals.iter().map(|m| m.calories).sum();
            println!(
                "\n{}: {} meal(s), {:.0} / {:.0} kcal",
                dash.date,
                dash.meals.len(),
                eaten,
                dash.targets.target_calories
            );
            for meal in &dash.meals {
                print_meal_line(meal);
            }
        }
        Command::Meal(cmd) => run_meal(&app, cmd).await?,
        Command::Profile(cmd) => run_profile(&app, cmd).await?,
        Command::Targets(cmd) => run_targets(&app, cmd).await?,
        Command::History(cmd) => run_history(&app, cmd).await?,
    }
    Ok(())
}

async fn run_meal(app: &App, cmd: MealCommand) -> SmartPlateResult<()> {
    match cmd {
        MealCommand::Log {
            name,
            description,
            photo,
            calories,
            protein,
            carbs,
            fat,
            date,
        } => {
            let mut req = match (photo, calories, protein, carbs, fat) {
                (Some(path), ..) => {
                    let image = std::fs::read(&path)?;
                    LogMealRequest::photo(&name, &description, &image)?
                }
                (None, Some(calories), Some(protein), Some(carbs), Some(fat)) => {
                    LogMealRequest::manual(
                        &name,
                        &description,
                        ManualMacros {
                            calories,
                            protein_g: protein,
                            carbs_g: carbs,
                            fat_g: fat,
                        },
                    )?
                }
                _ => {
                    return Err(SmartPlateError::InvalidRequest(
                        "provide either --photo or all of --calories/--protein/--carbs/--fat"
                            .to_string(),
                    ))
                }
            };
            if let Some(date) = date {
                req = req.on_date(parse_date(&date)?);
            }
            let meal = app.log_meal(&req).await?;
            println!("Logged meal {}:", meal.id);
            print_meal_line(&meal);
        }
        MealCommand::List { date } => {
            let date = parse_date_or_today(date.as_deref())?;
            let meals = app.meals_on(date).await?;
            if meals.is_empty() {
                println!("No meals logged on {date}.");
            }
            for meal in &meals {
                print_meal_line(meal);
            }
        }
        MealCommand::Show { id } => {
            let meal = app.meal(&id).await?;
            println!("{}", serde_json::to_string_pretty(&meal)?);
        }
        MealCommand::Delete { id } => {
            app.delete_meal(&id).await?;
            println!("Deleted meal {id}.");
        }
    }
    Ok(())
}

async fn run_profile(app: &App, cmd: ProfileCommand) -> SmartPlateResult<()> {
    match cmd {
        ProfileCommand::Show => {
            let profile = app.profile().await?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        ProfileCommand::Set {
            weight_kg,
            height_cm,
            age,
            sex,
            workouts_per_week,
            training_type,
            training_intensity,
            activity,
            goal,
            sleep_quality,
            stress_level,
            routine_consistency,
            workout_notes,
            activity_notes,
        } => {
            for (label, rating) in [
                ("--sleep-quality", sleep_quality),
                ("--stress-level", stress_level),
                ("--routine-consistency", routine_consistency),
            ] {
                if !(1..=5).contains(&rating) {
                    return Err(SmartPlateError::InvalidRequest(format!(
                        "{label} must be between 1 and 5"
                    )));
                }
            }
            let profile = UserProfile {
                weight_kg,
                height_cm,
                age,
                biological_sex: parse_sex(&sex)?,
                workouts_per_week,
                training_type: parse_training_type(&training_type)?,
                training_intensity: parse_intensity(&training_intensity)?,
                daily_activity_level: parse_activity(&activity)?,
                goal: parse_goal(&goal)?,
                sleep_quality,
                stress_level,
                routine_consistency,
                workout_notes,
                activity_notes,
            };
            let saved = app.save_profile(&profile).await?;
            println!("{}", serde_json::to_string_pretty(&saved)?);
        }
    }
    Ok(())
}

async fn run_targets(app: &App, cmd: TargetsCommand) -> SmartPlateResult<()> {
    let targets = match cmd {
        TargetsCommand::Show => app.targets().await?,
        TargetsCommand::Generate => app.generate_targets().await?,
        TargetsCommand::Set {
            calories,
            protein,
            carbs,
            fat,
            sleep_hours,
        } => {
            app.set_targets(&NutritionTargets {
                target_calories: calories,
                protein_target_g: protein,
                carbs_target_g: carbs,
                fat_target_g: fat,
                sleep_hours_target: sleep_hours,
            })
            .await?
        }
    };
    print_targets(&targets);
    Ok(())
}

async fn run_history(app: &App, cmd: HistoryCommand) -> SmartPlateResult<()> {
    match cmd {
        HistoryCommand::Meals { range } => {
            let range: MetricsRange = range.parse()?;
            let days = app.meal_metrics(range).await?;
            for day in &days {
                println!(
                    "{}  {:>6.0} kcal  P {:>5.1}g  C {:>5.1}g  F {:>5.1}g",
                    day.meal_date,
                    day.calories_total,
                    day.protein_g_total,
                    day.carbs_g_total,
                    day.fat_g_total
                );
            }
        }
        HistoryCommand::Body { range } => {
            let range: MetricsRange = range.parse()?;
            for entry in app.body_metrics(range).await? {
                println!("{}  {:.1} kg", entry.entry_date, entry.weight_kg);
            }
        }
    }
    Ok(())
}

fn print_targets(targets: &NutritionTargets) {
    println!(
        "Targets: {:.0} kcal, P {:.0}g / C {:.0}g / F {:.0}g",
        targets.target_calories,
        targets.protein_target_g,
        targets.carbs_target_g,
        targets.fat_target_g
    );
    if let Some(sleep) = targets.sleep_hours_target {
        println!("Sleep target: {sleep:.1} h");
    }
}

fn print_meal_line(meal: &Meal) {
    println!(
        "  [{}] {} {}  {:.0} kcal (P {:.0} / C {:.0} / F {:.0})",
        meal.id, meal.meal_time, meal.meal_name, meal.calories, meal.protein_g, meal.carbs_g,
        meal.fat_g
    );
}

fn parse_date(s: &str) -> SmartPlateResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| SmartPlateError::InvalidRequest(format!("invalid date '{s}', expected YYYY-MM-DD")))
}

fn parse_date_or_today(s: Option<&str>) -> SmartPlateResult<NaiveDate> {
    match s {
        Some(s) => parse_date(s),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn parse_sex(s: &str) -> SmartPlateResult<BiologicalSex> {
    match s.to_ascii_lowercase().as_str() {
        "male" => Ok(BiologicalSex::Male),
        "female" => Ok(BiologicalSex::Female),
        _ => Err(SmartPlateError::InvalidRequest(format!(
            "unknown sex '{s}', expected male or female"
        ))),
    }
}

fn parse_training_type(s: &str) -> SmartPlateResult<TrainingType> {
    match s.to_ascii_lowercase().as_str() {
        "strength" => Ok(TrainingType::Strength),
        "cardio" => Ok(TrainingType::Cardio),
        "crossfit" => Ok(TrainingType::Crossfit),
        "other" => Ok(TrainingType::Other),
        _ => Err(SmartPlateError::InvalidRequest(format!(
            "unknown training type '{s}'"
        ))),
    }
}

fn parse_intensity(s: &str) -> SmartPlateResult<TrainingIntensity> {
    match s.to_ascii_lowercase().as_str() {
        "low" => Ok(TrainingIntensity::Low),
        "moderate" => Ok(TrainingIntensity::Moderate),
        "high" => Ok(TrainingIntensity::High),
        _ => Err(SmartPlateError::InvalidRequest(format!(
            "unknown intensity '{s}', expected low, moderate or high"
        ))),
    }
}

fn parse_activity(s: &str) -> SmartPlateResult<DailyActivityLevel> {
    match s.to_ascii_lowercase().as_str() {
        "sedentary" => Ok(DailyActivityLevel::Sedentary),
        "light" => Ok(DailyActivityLevel::LightlyActive),
        "moderate" => Ok(DailyActivityLevel::ModeratelyActive),
        "very" => Ok(DailyActivityLevel::VeryActive),
        _ => Err(SmartPlateError::InvalidRequest(format!(
            "unknown activity level '{s}', expected sedentary, light, moderate or very"
        ))),
    }
}

fn parse_goal(s: &str) -> SmartPlateResult<Goal> {
    match s.to_ascii_lowercase().as_str() {
        "loss" => Ok(Goal::WeightLoss),
        "maintain" => Ok(Goal::Maintenance),
        "gain" => Ok(Goal::MuscleGain),
        _ => Err(SmartPlateError::InvalidRequest(format!(
            "unknown goal '{s}', expected loss, maintain or gain"
        ))),
    }
}
