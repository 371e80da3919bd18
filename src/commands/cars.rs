use anyhow::Result;
use colored::Colorize;
use log::info;

use crate::cli::commands::cars::CarsSubcommands;
use roadrater::cars::Car;
use roadrater::config::Config;

pub async fn cars_command(config: &Config, command: CarsSubcommands) -> Result<()> {
    match command {
        CarsSubcommands::Add { plate, make, model, year } => {
            info!("Saving car {}", plate);
            let car = Car::new(plate, make, model, year);
            let created = config.save_car(&car).await?;

            let verb = if created { "added" } else { "updated" };
            println!(
                "{} Car '{}' {}",
                "✓".bright_green().bold(),
                car.number_plate.bright_green().bold(),
                verb
            );
        }
        CarsSubcommands::Get { plate } => match config.get_car(&plate).await? {
            Some(car) => print_car(&car),
            None => anyhow::bail!("Car '{}' not found", plate),
        },
        CarsSubcommands::List { make } => {
            let cars = match &make {
                Some(make) => config.list_cars_by_make(make).await?,
                None => config.list_cars().await?,
            };

            if cars.is_empty() {
                println!("  {}", "No cars stored".dimmed());
                return Ok(());
            }

            println!("  {}", "Cars:".bright_white().bold());
            for car in &cars {
                println!(
                    "    {} {} {} ({})",
                    car.number_plate.cyan(),
                    car.make,
                    car.model,
                    car.year
                );
            }
        }
        CarsSubcommands::Remove { plate } => {
            config.delete_car(&plate).await?;
            println!(
                "{} Car '{}' removed",
                "✓".bright_green().bold(),
                plate.bright_green().bold()
            );
        }
    }

    Ok(())
}

fn print_car(car: &Car) {
    println!("{}", car.number_plate.bright_white().bold());
    println!("  Make: {}", car.make);
    println!("  Model: {}", car.model);
    println!("  Year: {}", car.year);
    match car.last_updated_at() {
        Some(at) => println!("  Last updated: {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("  Last updated: {}", car.last_updated),
    }
}
