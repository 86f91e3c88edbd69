//! CSS anchors for the catalog pages. Update here when the site layout moves.

use std::sync::LazyLock;

use scraper::Selector;

fn sel(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

/// Sidebar navigation blocks on the catalog root; the second one lists brands.
pub static LEFT_MENU: LazyLock<Selector> = LazyLock::new(|| sel("ul.left_menu-section"));
pub static LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| sel("li"));
pub static ANCHOR: LazyLock<Selector> = LazyLock::new(|| sel("a"));

pub static PRODUCT_LINK: LazyLock<Selector> = LazyLock::new(|| sel("a.cattable-wrap-cell-info"));

pub static IMAGE: LazyLock<Selector> = LazyLock::new(|| sel("img.main_image.is-zoomable"));
pub static NAME: LazyLock<Selector> = LazyLock::new(|| sel("h1.h2.desc_top-head-title"));
pub static RATING: LazyLock<Selector> = LazyLock::new(|| sel("div.review_agg"));
pub static PRICE: LazyLock<Selector> = LazyLock::new(|| sel("span.afterpay-full_price"));
pub static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| sel("div.check_read-inner"));

pub static SPEC_TABLE_BODY: LazyLock<Selector> = LazyLock::new(|| sel("tbody"));
pub static TABLE_CELL: LazyLock<Selector> = LazyLock::new(|| sel("td"));
pub static BOLD: LazyLock<Selector> = LazyLock::new(|| sel("strong"));

/// Spec cells carry a class containing this fragment (e.g. `Specs`, `tdSpecs`).
pub const SPEC_CELL_CLASS: &str = "Specs";
