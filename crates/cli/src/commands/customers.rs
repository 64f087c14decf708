use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use lunchly_core::config::LoadOptions;
use lunchly_core::domain::customer::{Customer, CustomerFields, CustomerId};
use lunchly_core::domain::reservation::Reservation;
use lunchly_core::errors::ApplicationError;
use lunchly_db::{
    CustomerRepository, RepositoryError, SqlCustomerRepository, DEFAULT_TOP_CUSTOMER_LIMIT,
};

use crate::commands::{with_migrated_pool, CommandResult, Failure};

#[derive(Debug, Clone, Subcommand)]
pub enum CustomerAction {
    #[command(about = "List every customer ordered by last name, then first name")]
    List,
    #[command(about = "Show one customer by id")]
    Show { id: i64 },
    #[command(about = "Case-insensitive substring search on the full name")]
    Search {
        #[arg(default_value = "")]
        term: String,
    },
    #[command(about = "Customers with the most reservations")]
    Top {
        #[arg(long, default_value_t = DEFAULT_TOP_CUSTOMER_LIMIT)]
        limit: u32,
    },
    #[command(about = "Exact first and last name lookup (first letter is capitalized)")]
    Find { first_name: String, last_name: String },
    #[command(about = "Create a customer")]
    Add {
        first_name: String,
        last_name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    #[command(about = "Overwrite every field of an existing customer")]
    Update {
        id: i64,
        first_name: String,
        last_name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    #[command(about = "List reservations for a customer")]
    Reservations { id: i64 },
}

impl CustomerAction {
    pub fn command_name(&self) -> &'static str {
        match self {
            Self::List => "customers.list",
            Self::Show { .. } => "customers.show",
            Self::Search { .. } => "customers.search",
            Self::Top { .. } => "customers.top",
            Self::Find { .. } => "customers.find",
            Self::Add { .. } => "customers.add",
            Self::Update { .. } => "customers.update",
            Self::Reservations { .. } => "customers.reservations",
        }
    }
}

#[derive(Debug, Serialize)]
struct CustomerView {
    id: Option<i64>,
    first_name: String,
    last_name: String,
    full_name: String,
    phone: Option<String>,
    notes: Option<String>,
}

impl From<&Customer> for CustomerView {
    fn from(customer: &Customer) -> Self {
        let fields = customer.fields();
        Self {
            id: customer.id().map(|id| id.0),
            first_name: fields.first_name.clone(),
            last_name: fields.last_name.clone(),
            full_name: customer.full_name(),
            phone: fields.phone.clone(),
            notes: fields.notes.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ReservationView {
    id: i64,
    customer_id: i64,
    start_at: String,
    num_guests: u32,
    notes: Option<String>,
}

impl From<&Reservation> for ReservationView {
    fn from(reservation: &Reservation) -> Self {
        Self {
            id: reservation.id.0,
            customer_id: reservation.customer_id.0,
            start_at: reservation.start_at.to_rfc3339(),
            num_guests: reservation.num_guests,
            notes: reservation.notes.clone(),
        }
    }
}

enum Reply {
    Customers(Vec<Customer>),
    Customer(Customer),
    Reservations(Customer, Vec<Reservation>),
}

pub fn run(options: &LoadOptions, action: CustomerAction) -> CommandResult {
    let command = action.command_name();

    let result = with_migrated_pool(options, |pool| async move {
        let repo = SqlCustomerRepository::new(pool);
        let reply = execute(&repo, action).await.map_err(classify)?;
        render(&reply).map_err(|error| {
            ("internal", format!("failed to serialize {command} response: {error}"), 9u8)
        })
    });

    match result {
        Ok((message, data)) => {
            info!(event_name = "cli.customers.completed", command, "customer command completed");
            CommandResult::success_with_data(command, message, Some(data))
        }
        Err(failure) => CommandResult::from_failure(command, failure),
    }
}

async fn execute(
    repo: &SqlCustomerRepository,
    action: CustomerAction,
) -> Result<Reply, RepositoryError> {
    let reply = match action {
        CustomerAction::List => Reply::Customers(repo.list_all().await?),
        CustomerAction::Show { id } => Reply::Customer(repo.find_by_id(CustomerId(id)).await?),
        CustomerAction::Search { term } => Reply::Customers(repo.search(&term).await?),
        CustomerAction::Top { limit } => {
            Reply::Customers(repo.top_by_reservation_count(limit).await?)
        }
        CustomerAction::Find { first_name, last_name } => {
            Reply::Customers(repo.find_by_exact_name(&first_name, &last_name).await?)
        }
        CustomerAction::Add { first_name, last_name, phone, notes } => {
            let mut customer =
                Customer::new(CustomerFields { first_name, last_name, phone, notes });
            repo.save(&mut customer).await?;
            Reply::Customer(customer)
        }
        CustomerAction::Update { id, first_name, last_name, phone, notes } => {
            let mut customer = repo.find_by_id(CustomerId(id)).await?;
            *customer.fields_mut() = CustomerFields { first_name, last_name, phone, notes };
            repo.save(&mut customer).await?;
            Reply::Customer(customer)
        }
        CustomerAction::Reservations { id } => {
            let customer = repo.find_by_id(CustomerId(id)).await?;
            let reservations = repo.reservations(&customer).await?;
            Reply::Reservations(customer, reservations)
        }
    };
    Ok(reply)
}

/// Payload message and `data` for a successful reply.
fn render(reply: &Reply) -> Result<(String, Value), serde_json::Error> {
    match reply {
        Reply::Customers(customers) => {
            let views: Vec<CustomerView> = customers.iter().map(CustomerView::from).collect();
            Ok((format!("{} customers", views.len()), serde_json::to_value(views)?))
        }
        Reply::Customer(customer) => {
            Ok((customer.full_name(), serde_json::to_value(CustomerView::from(customer))?))
        }
        Reply::Reservations(customer, reservations) => {
            let views: Vec<ReservationView> =
                reservations.iter().map(ReservationView::from).collect();
            let message = format!("{} reservations for {}", views.len(), customer.full_name());
            Ok((message, serde_json::to_value(views)?))
        }
    }
}

fn classify(error: RepositoryError) -> Failure {
    let message = error.to_string();
    let (error_class, exit_code) =
        match ApplicationError::from(error).into_interface("cli").status_code() {
            404 => ("not_found", 7),
            503 => ("storage", 8),
            _ => ("internal", 9),
        };
    (error_class, message, exit_code)
}
