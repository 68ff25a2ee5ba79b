//! Browse the catalog of a running storefront and manage the local cart.
//!
//! Drives the same controller a graphical front end would: mount, apply
//! filters, click "load more", then print what would be on screen.

use std::sync::Arc;

use tracing::info;

use dharma_client::controller::{CatalogController, CatalogState, Event};
use dharma_client::{CartStore, ClientConfig, FileStorage, HttpCatalogClient};
use dharma_core::{Category, CategoryId, PriceRange};

/// Characters of description shown per product.
const EXCERPT_CHARS: usize = 60;

/// Options for a browse session.
#[derive(Debug, Default)]
pub struct BrowseOptions {
    /// Category slugs to check, in order.
    pub categories: Vec<String>,
    /// Price range id to select.
    pub price: Option<u8>,
    /// Number of "load more" clicks.
    pub load_more: u32,
    /// Product slugs to add to the cart from the final listing.
    pub add_to_cart: Vec<String>,
}

/// Resolve category slugs against the loaded categories.
///
/// # Errors
///
/// Returns the first slug that does not name a category.
pub fn resolve_categories(
    categories: &[Category],
    slugs: &[String],
) -> Result<Vec<CategoryId>, String> {
    slugs
        .iter()
        .map(|slug| {
            categories
                .iter()
                .find(|c| &c.slug == slug)
                .map(|c| c.id)
                .ok_or_else(|| format!("unknown category '{slug}'"))
        })
        .collect()
}

/// Resolve category slugs once the categories have been fetched.
///
/// # Errors
///
/// Reports a failed categories fetch before any slug lookup, so an outage
/// is not mistaken for an unknown slug.
pub fn selected_categories(
    state: &CatalogState,
    slugs: &[String],
) -> Result<Vec<CategoryId>, String> {
    if slugs.is_empty() {
        return Ok(Vec::new());
    }
    if let Some(error) = state.categories_error() {
        return Err(format!("could not load categories: {error}"));
    }
    resolve_categories(state.categories(), slugs)
}

/// Run a browse session against the configured backend.
///
/// # Errors
///
/// Returns an error if configuration is invalid, a category slug or price
/// range id is unknown, or the cart cannot be written.
pub async fn run(options: BrowseOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    info!(backend = %config.backend_url, "Browsing catalog");

    let client = HttpCatalogClient::new(&config)?;
    let mut controller = CatalogController::new(Arc::new(client.clone()));

    controller.dispatch(Event::Mounted).await;

    let category_ids = selected_categories(controller.state(), &options.categories)?;
    for id in category_ids {
        controller
            .dispatch(Event::CategoryToggled { id, checked: true })
            .await;
    }

    if let Some(price_id) = options.price {
        let range = PriceRange::by_id(price_id)
            .ok_or_else(|| format!("unknown price range {price_id}"))?;
        controller.dispatch(Event::PriceSelected(Some(range))).await;
    }

    for _ in 0..options.load_more {
        if !controller.state().load_more_visible() {
            break;
        }
        controller.dispatch(Event::LoadMoreRequested).await;
    }

    print_listing(controller.state(), &client);

    if !options.add_to_cart.is_empty() {
        let mut cart = CartStore::load(Arc::new(FileStorage::new(&config.cart_dir)));
        for slug in &options.add_to_cart {
            let product = controller
                .state()
                .products()
                .iter()
                .find(|p| &p.slug == slug)
                .ok_or_else(|| format!("product '{slug}' is not in the listing"))?;
            let notice = cart.add(product.clone())?;
            #[allow(clippy::print_stdout)]
            {
                println!("{notice}: {}", product.name);
            }
        }
    }

    Ok(())
}

/// Print the persisted cart.
///
/// # Errors
///
/// Returns an error if configuration is invalid.
pub fn show_cart() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let cart = CartStore::load(Arc::new(FileStorage::new(&config.cart_dir)));

    #[allow(clippy::print_stdout)]
    {
        if cart.is_empty() {
            println!("Cart is empty");
            return Ok(());
        }
        println!("Cart ({} items)", cart.len());
        for item in cart.items() {
            println!("  {:<40} {:>10}", item.name, item.price.to_string());
        }
    }
    Ok(())
}

fn print_listing(state: &CatalogState, client: &HttpCatalogClient) {
    #[allow(clippy::print_stdout)]
    {
        let names: Vec<_> = state.categories().iter().map(|c| c.name.as_str()).collect();
        println!("Categories: {}", names.join(", "));
        println!(
            "Price ranges: {}",
            dharma_core::PRICE_RANGES
                .iter()
                .map(|r| format!("[{}] {}", r.id, r.label))
                .collect::<Vec<_>>()
                .join("  ")
        );
        println!();

        for product in state.products() {
            println!("{:<40} {:>10}", product.name, product.price.to_string());
            println!("    {}", product.excerpt(EXCERPT_CHARS));
            if let Ok(url) = client.photo_url(product.id) {
                println!("    {url}");
            }
        }

        println!();
        match state.total() {
            Some(total) => println!("Showing {} of {total}", state.products().len()),
            None => println!("Showing {}", state.products().len()),
        }
        if state.load_more_visible() {
            println!("More available: pass --load-more");
        }
        if let Some(error) = state.last_error() {
            println!("Last request failed ({:?}): {}", error.kind, error.message);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dharma_client::controller::{Outcome, transition};

    use super::*;

    #[test]
    fn test_resolve_categories() {
        let tools = Category {
            id: CategoryId::random(),
            name: "Tools".into(),
            slug: "tools".into(),
        };
        let categories = vec![tools.clone()];

        assert_eq!(
            resolve_categories(&categories, &["tools".to_string()]).unwrap(),
            [tools.id]
        );
        assert!(resolve_categories(&categories, &["garden".to_string()]).is_err());
    }

    #[test]
    fn test_failed_categories_fetch_reported_over_unknown_slug() {
        let (state, _) = transition(CatalogState::new(), Event::Mounted);
        let tag = state.session();
        let (state, _) = transition(
            state,
            Event::Completed {
                tag,
                outcome: Outcome::Categories(Err("backend returned 503".into())),
            },
        );

        let error = selected_categories(&state, &["tools".to_string()]).unwrap_err();
        assert_eq!(error, "could not load categories: backend returned 503");
        assert!(selected_categories(&state, &[]).unwrap().is_empty());
    }
}
