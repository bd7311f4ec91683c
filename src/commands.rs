use beercellar::beer::{Beer, BeerSize, format_date};
use beercellar::beer_cellar::BOX_COUNT;
use beercellar::error::Result;
use beercellar::{BeerCellar, CellarBox, Change, Credentials, Interval, UntappdClient};
use chrono::NaiveDate;
use colored::Colorize;
use serde::Serialize;

#[derive(Serialize)]
struct Listing {
    bombers: Vec<Beer>,
    smalls: Vec<Beer>,
}

async fn print_beer(client: &mut UntappdClient, beer: &Beer) {
    println!(
        "  {} {}",
        format_date(beer.drink_date).dimmed(),
        client.beer_name(beer.id).await
    );
}

async fn print_box(client: &mut UntappdClient, number: usize, cellar_box: &CellarBox) {
    let size = cellar_box
        .box_size()
        .map(BeerSize::as_str)
        .unwrap_or("empty");
    println!(
        "{} {}",
        format!("==> Box {}", number).bold().green(),
        format!("({}, {})", cellar_box.name(), size).dimmed()
    );

    for beer in cellar_box.beers() {
        print_beer(client, beer).await;
    }
}

async fn print_diff(client: &mut UntappdClient, diffs: &[Vec<Change>; BOX_COUNT]) {
    for (i, changes) in diffs.iter().enumerate() {
        if changes.is_empty() {
            continue;
        }

        println!("{}", format!("Found diff in box {}", i + 1).bold());
        for change in changes {
            let name = client.beer_name(change.beer().id).await;
            let line = format!("{} {} ({})", change.sign(), name, format_date(change.beer().drink_date));
            match change {
                Change::Added(_) => println!("  {}", line.green()),
                Change::Removed(_) => println!("  {}", line.red()),
            }
        }
    }
}

pub async fn add(
    cellar: &mut BeerCellar,
    client: &mut UntappdClient,
    id: i64,
    date: NaiveDate,
    size: BeerSize,
    interval: Option<Interval>,
    count: u32,
) -> Result<()> {
    // A series that fails part way keeps the bottles already placed
    let outcome = match interval {
        Some(interval) => cellar.add_beer_repeating(id, date, size, interval, count),
        None => cellar
            .add_beer(id, date, size)
            .map(|placed| placed.into_iter().collect::<Vec<_>>()),
    };

    match cellar.diff_against_disk() {
        Ok(diffs) => {
            for (index, changes) in diffs.iter().enumerate() {
                if let Some(cellar_box) = cellar.cellar_box(index).filter(|_| !changes.is_empty()) {
                    print_box(client, index + 1, cellar_box).await;
                }
            }
            print_diff(client, &diffs).await;
        }
        Err(e) => tracing::warn!("Cannot compare with the saved cellar: {}", e),
    }

    let placed = outcome?;
    if placed.is_empty() {
        println!("{} Nothing added for id {}", "⚠".yellow(), id);
    } else {
        println!(
            "{} Added {} bottle(s) of {}",
            "✓".green(),
            placed.len().to_string().bold(),
            id
        );
    }

    Ok(())
}

pub async fn list(
    cellar: &BeerCellar,
    client: &mut UntappdClient,
    bombers: usize,
    smalls: usize,
    json: bool,
) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let listing = Listing {
        bombers: cellar.list_beers(bombers, BeerSize::Bomber, today),
        smalls: cellar.list_beers(smalls, BeerSize::Small, today),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("{}", "==> Bombers".bold().green());
    for beer in &listing.bombers {
        print_beer(client, beer).await;
    }

    println!("{}", "==> Smalls".bold().green());
    for beer in &listing.smalls {
        print_beer(client, beer).await;
    }

    Ok(())
}

pub async fn print_cellar(cellar: &BeerCellar, client: &mut UntappdClient) {
    for (i, cellar_box) in cellar.boxes().iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_box(client, i + 1, cellar_box).await;
    }
}

pub async fn remove(cellar: &mut BeerCellar, client: &mut UntappdClient, id: u32) {
    match cellar.remove_beer(id) {
        Some((index, beer)) => {
            println!(
                "{} Removed {} from box {}",
                "✓".green(),
                client.beer_name(beer.id).await.bold(),
                index + 1
            );
            if let Some(cellar_box) = cellar.cellar_box(index) {
                print_box(client, index + 1, cellar_box).await;
            }
        }
        None => println!("{} No bottle of {} in the cellar", "⚠".yellow(), id),
    }
}

pub async fn sync(cellar: &mut BeerCellar, client: &mut UntappdClient) -> Result<()> {
    let since = cellar.sync_time();
    println!("Syncing drinks since {}", format_date(since).cyan());

    let drunk = client.recent_drinks(since).await?;
    let removed = cellar.sync_consumed(&drunk);

    println!(
        "{} {} check-ins, {} bottle(s) removed",
        "✓".green(),
        drunk.len(),
        removed.len().to_string().bold()
    );
    for beer in &removed {
        print_beer(client, beer).await;
    }

    Ok(())
}

pub fn untappd(cellar: &mut BeerCellar, key: &str, secret: &str) {
    cellar.set_credentials(Credentials::new(key, secret));
    println!("{} Untappd credentials saved", "✓".green());
}

pub fn version(cellar: &BeerCellar) {
    println!("BeerCellar: {}", cellar.version().bold());
    println!("Loaded From: {}", cellar.dir().display().to_string().cyan());
}

pub fn slots(cellar: &BeerCellar) {
    let (bombers, smalls) = cellar.free_slots();
    println!();
    println!("There are {} free bomber slots", bombers.to_string().bold());
    println!("There are {} free small slots", smalls.to_string().bold());
}
