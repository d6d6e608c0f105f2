//! `toothfixers`: terminal front end for the clinic client.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use toothfixers_core::config::{self, ClientConfig};
use toothfixers_core::views::{
    home_links, CreatePatientView, CreateRecordView, SearchPatientView, SearchRecordView,
    HOME_TAGLINE, HOME_TITLE,
};
use toothfixers_core::{
    ClinicalRecord, HttpClinicApi, Outcome, Patient, Route, Session, ToastLevel, ViewError,
};

#[derive(Parser)]
#[command(name = "toothfixers", version, about = "ToothFixers patient and clinical record manager")]
struct Cli {
    /// Backend base URL (defaults to TOOTHFIXERS_API_URL or http://localhost:3000)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the landing screen
    Home,
    /// Open the screen for a path such as /clinical-records/42
    Open { path: String },
    /// Manage patients
    #[command(subcommand)]
    Patient(PatientCommand),
    /// Manage clinical records
    #[command(subcommand)]
    Record(RecordCommand),
}

#[derive(Subcommand)]
enum PatientCommand {
    /// Register a new patient
    Create {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        sur_name: String,
        #[arg(long, default_value = "")]
        middle_name: String,
        #[arg(long)]
        home_address: String,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date_of_birth: Option<NaiveDate>,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date_of_registration: Option<NaiveDate>,
    },
    /// List patients, optionally filtered by name
    List {
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// Change some fields of a patient
    Update {
        id: u64,
        #[command(flatten)]
        fields: PatientFields,
    },
    /// Delete a patient
    Delete { id: u64 },
}

#[derive(Args)]
struct PatientFields {
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    sur_name: Option<String>,
    #[arg(long)]
    middle_name: Option<String>,
    #[arg(long)]
    home_address: Option<String>,
    #[arg(long)]
    date_of_birth: Option<NaiveDate>,
    #[arg(long)]
    date_of_registration: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum RecordCommand {
    /// Add a clinical record
    Create {
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        clinic_date: Option<NaiveDate>,
        #[arg(long)]
        ailment: String,
        #[arg(long, default_value = "")]
        medicine: String,
        #[arg(long)]
        procedure: String,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        next_appointment: Option<NaiveDate>,
    },
    /// List every clinical record
    List,
    /// Show one clinical record
    Show { id: String },
    /// Edit a clinical record; every field is sent
    Update {
        id: u64,
        #[command(flatten)]
        fields: RecordFields,
    },
    /// Delete a clinical record
    Delete { id: u64 },
}

#[derive(Args)]
struct RecordFields {
    #[arg(long)]
    clinic_date: Option<String>,
    #[arg(long)]
    ailment: Option<String>,
    /// Empty string clears the medicine
    #[arg(long)]
    medicine: Option<String>,
    #[arg(long)]
    procedure: Option<String>,
    /// Empty string clears the next appointment
    #[arg(long)]
    next_appointment: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let cli = Cli::parse();
    let session = connect(&cli)?;
    tracing::debug!("{} v{}", config::APP_NAME, config::APP_VERSION);

    let result = match cli.command {
        Commands::Home => {
            show_home();
            Ok(())
        }
        Commands::Open { path } => open(&session, &path),
        Commands::Patient(cmd) => run_patient(&session, cmd),
        Commands::Record(cmd) => run_record(&session, cmd),
    };

    print_toasts(&session);
    result
}

fn connect(cli: &Cli) -> Result<Session> {
    let mut config = ClientConfig::from_env().context("Invalid environment configuration")?;
    if let Some(url) = &cli.base_url {
        config = ClientConfig::new(url).with_timeout(config.timeout_secs);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(secs);
    }
    let api = HttpClinicApi::new(&config).context("Failed to build HTTP client")?;
    Ok(Session::new(Arc::new(api)))
}

fn show_home() {
    println!("{}", HOME_TITLE);
    println!("{}", HOME_TAGLINE);
    println!();
    for link in home_links() {
        println!("  {:<30} {}", link.label, link.route.path());
    }
}

fn open(session: &Session, path: &str) -> Result<()> {
    let route = Route::parse(path)?;
    println!("{}", route.title());
    match route {
        Route::Home => {
            show_home();
            Ok(())
        }
        Route::CreatePatient => {
            println!("Use `toothfixers patient create` to register a patient.");
            Ok(())
        }
        Route::CreateClinicalRecord => {
            println!("Use `toothfixers record create` to add a clinical record.");
            Ok(())
        }
        Route::Patients => run_patient(
            session,
            PatientCommand::List {
                query: String::new(),
            },
        ),
        Route::ClinicalRecords { id } => {
            let mut view = SearchRecordView::new(session.clone());
            applied(view.enter(id.as_deref()))?;
            match view.record() {
                Some(record) => print_record(record),
                None => view.records().iter().for_each(print_record),
            }
            Ok(())
        }
    }
}

fn run_patient(session: &Session, cmd: PatientCommand) -> Result<()> {
    match cmd {
        PatientCommand::Create {
            first_name,
            sur_name,
            middle_name,
            home_address,
            date_of_birth,
            date_of_registration,
        } => {
            let mut view = CreatePatientView::new(session.clone());
            let form = view.form_mut();
            form.first_name = first_name;
            form.sur_name = sur_name;
            form.middle_name = middle_name;
            form.home_address = home_address;
            if date_of_birth.is_some() {
                form.date_of_birth = date_of_birth;
            }
            if date_of_registration.is_some() {
                form.date_of_registration = date_of_registration;
            }
            if let Some(patient) = applied(view.submit())? {
                print_patient(&patient);
            }
        }
        PatientCommand::List { query } => {
            let mut view = SearchPatientView::new(session.clone());
            applied(view.enter())?;
            view.set_query(query);
            let patients = view.patients();
            if patients.is_empty() {
                println!("No patients found.");
            }
            patients.iter().for_each(print_patient);
        }
        PatientCommand::Update { id, fields } => {
            let mut view = SearchPatientView::new(session.clone());
            applied(view.enter())?;
            if !view.select(id) {
                bail!("No patient with id {}", id);
            }
            if let Some(editor) = view.editor_mut() {
                let form = editor.form_mut();
                if let Some(v) = fields.first_name {
                    form.first_name = v;
                }
                if let Some(v) = fields.sur_name {
                    form.sur_name = v;
                }
                if let Some(v) = fields.middle_name {
                    form.middle_name = v;
                }
                if let Some(v) = fields.home_address {
                    form.home_address = v;
                }
                if fields.date_of_birth.is_some() {
                    form.date_of_birth = fields.date_of_birth;
                }
                if fields.date_of_registration.is_some() {
                    form.date_of_registration = fields.date_of_registration;
                }
            }
            match applied(view.submit_update())? {
                Some(Some(patient)) => print_patient(&patient),
                Some(None) => println!("No changes."),
                None => {}
            }
        }
        PatientCommand::Delete { id } => {
            applied(SearchPatientView::new(session.clone()).delete(id))?;
        }
    }
    Ok(())
}

fn run_record(session: &Session, cmd: RecordCommand) -> Result<()> {
    match cmd {
        RecordCommand::Create {
            clinic_date,
            ailment,
            medicine,
            procedure,
            next_appointment,
        } => {
            let mut view = CreateRecordView::new(session.clone());
            let form = view.form_mut();
            if clinic_date.is_some() {
                form.clinic_date = clinic_date;
            }
            form.nature_of_ailment = ailment;
            form.medicine_prescribed = medicine;
            form.procedure_undertaken = procedure;
            if next_appointment.is_some() {
                form.date_of_next_appointment = next_appointment;
            }
            if let Some(record) = applied(view.submit())? {
                print_record(&record);
            }
        }
        RecordCommand::List => {
            let mut view = SearchRecordView::new(session.clone());
            applied(view.load_all())?;
            let records = view.records();
            if records.is_empty() {
                println!("No clinical records found.");
            }
            records.iter().for_each(print_record);
        }
        RecordCommand::Show { id } => {
            let mut view = SearchRecordView::new(session.clone());
            if let Some(record) = applied(view.lookup(&id))? {
                print_record(&record);
            }
        }
        RecordCommand::Update { id, fields } => {
            let mut view = SearchRecordView::new(session.clone());
            applied(view.lookup(&id.to_string()))?;
            if !view.open_editor(id) {
                bail!("No clinical record with id {}", id);
            }
            if let Some(editor) = view.editor_mut() {
                let form = editor.form_mut();
                if let Some(v) = fields.clinic_date {
                    form.clinic_date = v;
                }
                if let Some(v) = fields.ailment {
                    form.nature_of_ailment = v;
                }
                if let Some(v) = fields.medicine {
                    form.medicine_prescribed = v;
                }
                if let Some(v) = fields.procedure {
                    form.procedure_undertaken = v;
                }
                if let Some(v) = fields.next_appointment {
                    form.date_of_next_appointment = v;
                }
            }
            if let Some(Some(record)) = applied(view.submit_update())? {
                print_record(&record);
            }
        }
        RecordCommand::Delete { id } => {
            applied(SearchRecordView::new(session.clone()).delete(id))?;
        }
    }
    Ok(())
}

/// Unwrap a screen result; a superseded response yields `None`.
fn applied<T>(result: Result<Outcome<T>, ViewError>) -> Result<Option<T>> {
    match result {
        Ok(outcome) => Ok(outcome.applied()),
        Err(e) => bail!("{} ({:?})", e, e.kind),
    }
}

fn print_patient(patient: &Patient) {
    let id = patient
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "#{:<5} {:<30} born {}  registered {}  {}",
        id,
        patient.search_text().trim(),
        patient.date_of_birth,
        patient.date_of_registration,
        patient.home_address
    );
}

fn print_record(record: &ClinicalRecord) {
    println!(
        "#{:<5} {}  {} / {}  medicine: {}  next: {}",
        record.id,
        record.clinic_date,
        record.nature_of_ailment,
        record.procedure_undertaken,
        record.medicine_label(),
        record.next_appointment_label()
    );
}

fn print_toasts(session: &Session) {
    for toast in session.drain_toasts() {
        match toast.level {
            ToastLevel::Success => println!("[ok] {}", toast.message),
            ToastLevel::Error => eprintln!("[error] {}", toast.message),
        }
    }
}
