use scraper::{ElementRef, Html};
use url::Url;

use super::selectors as css;
use crate::error::{CollectError, CollectResult};
use crate::table::{RawRecord, Value};

/// Spec labels given to a product page that has no specs table, so every
/// record contributes the same spec columns.
pub const DEFAULT_SPEC_KEYS: &[&str] = &[
    "Head Size",
    "Length",
    "Strung Weight",
    "Balance",
    "Swingweight",
    "Stiffness",
    "Beam Width",
    "Composition",
    "Power Level",
    "Stroke Style",
    "Swing Speed",
    "Racquet Colors",
    "Grip Type",
    "String Pattern",
    "String Tension",
];

/// Key for spec rows that have no bold label.
pub const OTHER_LABEL: &str = "Other";

fn text_of(el: ElementRef) -> String {
    el.text().collect::<String>()
}

/// Brand page URLs from the second sidebar menu of the catalog root.
pub fn parse_brand_links(html: &str, page_url: &Url) -> CollectResult<Vec<Url>> {
    let document = Html::parse_document(html);
    let mismatch = |detail: String| CollectError::StructureMismatch {
        url: page_url.to_string(),
        detail,
    };

    let menus: Vec<ElementRef> = document.select(&css::LEFT_MENU).collect();
    let brand_menu = menus
        .get(1)
        .ok_or_else(|| mismatch(format!("expected 2+ sidebar menus, found {}", menus.len())))?;

    let links = brand_menu
        .select(&css::LIST_ITEM)
        .enumerate()
        .map(|(i, item)| -> CollectResult<Url> {
            let href = item
                .select(&css::ANCHOR)
                .next()
                .and_then(|a| a.value().attr("href"))
                .ok_or_else(|| mismatch(format!("brand entry {} has no link", i + 1)))?;
            Ok(page_url.join(href)?)
        })
        .collect::<CollectResult<Vec<Url>>>()?;

    if links.is_empty() {
        return Err(mismatch("brand menu has no entries".to_string()));
    }
    Ok(links)
}

/// Product URLs listed on a brand page. Only absolute links under
/// `site_origin` count; anything else is navigation chrome and is skipped.
pub fn parse_product_links(html: &str, site_origin: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let prefix = format!("{}/", site_origin.trim_end_matches('/'));

    document
        .select(&css::PRODUCT_LINK)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.starts_with(&prefix))
        .map(str::to_string)
        .collect()
}

/// Parse a product page into a raw record: identity fields, then specs.
pub fn parse_product(html: &str, url: &str) -> CollectResult<RawRecord> {
    let document = Html::parse_document(html);
    let missing = |field: &'static str| CollectError::MissingField {
        url: url.to_string(),
        field,
    };
    let number = |field: &'static str, text: &str| {
        text.trim().parse::<f64>().map_err(|_| CollectError::Parse {
            url: url.to_string(),
            field,
            text: text.trim().to_string(),
        })
    };

    let img = document
        .select(&css::IMAGE)
        .next()
        .and_then(|el| el.value().attr("src"))
        .ok_or_else(|| missing("image"))?;

    let name = document
        .select(&css::NAME)
        .next()
        .map(text_of)
        .ok_or_else(|| missing("name"))?;

    let rating = match document.select(&css::RATING).next() {
        Some(el) => Value::Number(number("rating", &text_of(el))?),
        None => Value::Null,
    };

    let price_text = document
        .select(&css::PRICE)
        .next()
        .map(text_of)
        .ok_or_else(|| missing("price"))?;
    let price = number("price", &price_text)?;

    let desc = document
        .select(&css::DESCRIPTION)
        .next()
        .map(text_of)
        .ok_or_else(|| missing("description"))?;

    let mut record = RawRecord::new();
    record.insert("racquet_img", Value::from(img));
    record.insert("racquet_name", Value::from(name.trim()));
    record.insert("racquet_rating", rating);
    record.insert("racquet_price", Value::Number(price));
    record.insert("racquet_desc", Value::from(desc.trim()));

    for (label, value) in parse_specs(&document) {
        record.insert(label, value);
    }

    Ok(record)
}

/// Label/value pairs from the first table body. Pages without one get the
/// default key set, all null.
fn parse_specs(document: &Html) -> Vec<(String, Value)> {
    let Some(body) = document.select(&css::SPEC_TABLE_BODY).next() else {
        return DEFAULT_SPEC_KEYS
            .iter()
            .map(|k| (k.to_string(), Value::Null))
            .collect();
    };

    body.select(&css::TABLE_CELL)
        .filter(|td| td.value().classes().any(|c| c.contains(css::SPEC_CELL_CLASS)))
        .map(|td| {
            let text = text_of(td);
            match td.select(&css::BOLD).next() {
                Some(strong) => {
                    let label = text_of(strong)
                        .split(':')
                        .next()
                        .unwrap_or_default()
                        .trim()
                        .to_string();
                    let value = text
                        .split_once(':')
                        .map(|(_, v)| Value::from(v.trim()))
                        .unwrap_or(Value::Null);
                    (label, value)
                }
                None => (OTHER_LABEL.to_string(), Value::from(text.trim())),
            }
        })
        .collect()
}
