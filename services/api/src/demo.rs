use crate::infra::{InMemoryAgentDirectory, InMemoryCategoryRepository, InMemoryHouseRepository};
use clap::Args;
use house_renting::categories::CategoryId;
use house_renting::config::ListingConfig;
use house_renting::error::AppError;
use house_renting::forms::decimal::DecimalLocale;
use house_renting::listings::{
    AllHousesQuery, HouseCatalogueService, HouseForm, HouseId, HouseServiceError, Principal,
    RentalError,
};
use std::sync::Arc;
use std::thread;

const DEMO_AGENT: &str = "agent-7";
const DEMO_RENTERS: [&str; 4] = ["user-42", "user-99", "user-13", "user-21"];

type DemoCatalogue =
    HouseCatalogueService<InMemoryHouseRepository, InMemoryAgentDirectory, InMemoryCategoryRepository>;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Monthly price as typed into the listing form, either separator accepted
    #[arg(long, default_value = "1250,50")]
    pub(crate) price: String,
    /// Decimal separator the price is normalized to ('.' or ',')
    #[arg(long, default_value_t = '.', value_parser = parse_separator)]
    pub(crate) separator: char,
    /// Skip the concurrent rent race at the end of the walkthrough
    #[arg(long)]
    pub(crate) skip_race: bool,
}

fn parse_separator(raw: &str) -> Result<char, String> {
    let mut chars = raw.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(separator), None) if DecimalLocale::new(separator).is_some() => Ok(separator),
        _ => Err(format!("'{raw}' is not a supported decimal separator")),
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        price,
        separator,
        skip_race,
    } = args;

    let catalogue = demo_catalogue(separator)?;
    let agent = Principal::user(DEMO_AGENT);

    println!("House renting demo");
    let house_id = catalogue.add(&agent, &demo_form(&price))?;
    let details = catalogue.details(&house_id)?;
    println!(
        "- {} listed '{}' at {} per month ({})",
        DEMO_AGENT,
        details.title,
        details.price_per_month,
        details.category.as_deref().unwrap_or("uncategorised")
    );

    println!("\nOccupancy walkthrough");
    let rentals = catalogue.rentals();
    report("user-42 rents", rentals.rent(&house_id, &Principal::user("user-42")));
    report("user-99 rents", rentals.rent(&house_id, &Principal::user("user-99")));
    report("user-99 leaves", rentals.leave(&house_id, &Principal::user("user-99")));
    report("agent-7 rents", rentals.rent(&house_id, &agent));
    report("user-42 leaves", rentals.leave(&house_id, &Principal::user("user-42")));
    report("user-42 leaves", rentals.leave(&house_id, &Principal::user("user-42")));

    if !skip_race {
        run_race(&catalogue, house_id);
    }

    let listing = catalogue.all(&AllHousesQuery::default())?;
    println!("\nListing");
    for house in &listing.houses {
        let state = if house.is_rented { "rented" } else { "vacant" };
        println!("- {} | {} | {}", house.title, house.price_per_month, state);
    }

    Ok(())
}

fn demo_catalogue(separator: char) -> Result<DemoCatalogue, AppError> {
    let agents = InMemoryAgentDirectory::default();
    agents
        .register(DEMO_AGENT)
        .map_err(HouseServiceError::from)?;

    let config = ListingConfig {
        decimal_locale: DecimalLocale::new(separator).unwrap_or_default(),
        ..ListingConfig::default()
    };

    Ok(HouseCatalogueService::new(
        Arc::new(InMemoryHouseRepository::default()),
        Arc::new(agents),
        Arc::new(InMemoryCategoryRepository::default()),
        config,
    ))
}

fn demo_form(price: &str) -> HouseForm {
    HouseForm {
        title: "Grand House Beach".to_string(),
        address: "Sea Garden Boulevard 12, Varna, Bulgaria".to_string(),
        description: "Newly renovated house two minutes from the beach with a view of the sea."
            .to_string(),
        image_url: "https://images.example.com/beach.jpg".to_string(),
        price_per_month: Some(price.to_string()),
        category_id: Some(CategoryId(1)),
    }
}

fn run_race(catalogue: &DemoCatalogue, house_id: HouseId) {
    println!("\nConcurrent rent race ({} renters)", DEMO_RENTERS.len());
    let rentals = catalogue.rentals();
    let outcomes: Vec<(&str, Result<(), RentalError>)> = thread::scope(|scope| {
        let handles: Vec<_> = DEMO_RENTERS
            .iter()
            .map(|renter| {
                scope.spawn(move || {
                    let outcome = rentals
                        .rent(&house_id, &Principal::user(*renter))
                        .map(|_| ());
                    (*renter, outcome)
                })
            })
            .collect();
        handles
            .into_iter()
            .filter_map(|handle| handle.join().ok())
            .collect()
    });

    for (renter, outcome) in outcomes {
        match outcome {
            Ok(()) => println!("- {renter}: won the house"),
            Err(err) => println!("- {renter}: {err}"),
        }
    }
}

fn report<T>(label: &str, outcome: Result<T, RentalError>) {
    match outcome {
        Ok(_) => println!("- {label}: ok"),
        Err(err) => println!("- {label}: rejected ({err})"),
    }
}
