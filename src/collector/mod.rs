pub mod pages;
pub mod selectors;

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};
use url::Url;

use crate::error::{CollectError, CollectResult};
use crate::table::{RawRecord, Table};

/// Walks catalog root → brand pages → product pages.
///
/// Pages are requested as plain GETs with no extra headers. Every step is
/// fail-fast: the first page that does not parse aborts the run.
#[derive(Clone)]
pub struct Collector {
    client: reqwest::Client,
    concurrency: usize,
}

impl Collector {
    /// `timeout_secs == 0` leaves requests without a timeout.
    pub fn new(timeout_secs: u64, concurrency: usize) -> CollectResult<Self> {
        let mut builder = reqwest::Client::builder();
        if timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let client = builder.build().map_err(CollectError::Client)?;
        Ok(Self {
            client,
            concurrency: concurrency.max(1),
        })
    }

    async fn fetch(&self, url: &str) -> CollectResult<String> {
        let http = |source: reqwest::Error| CollectError::Http {
            url: url.to_string(),
            source,
        };
        debug!("GET {}", url);
        self.client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(http)?
            .text()
            .await
            .map_err(http)
    }

    pub async fn list_brand_pages(&self, root_url: &str) -> CollectResult<Vec<Url>> {
        let root = Url::parse(root_url)?;
        let html = self.fetch(root.as_str()).await?;
        pages::parse_brand_links(&html, &root)
    }

    pub async fn list_product_pages(&self, brand_url: &Url) -> CollectResult<Vec<String>> {
        let html = self.fetch(brand_url.as_str()).await?;
        let origin = brand_url.origin().ascii_serialization();
        Ok(pages::parse_product_links(&html, &origin))
    }

    pub async fn fetch_product_record(&self, product_url: &str) -> CollectResult<RawRecord> {
        let html = self.fetch(product_url).await?;
        pages::parse_product(&html, product_url)
    }

    /// Fetch every product of one brand. Up to `concurrency` requests run at
    /// once; records come back in listing order.
    async fn fetch_brand_records(&self, product_urls: Vec<String>) -> CollectResult<Vec<RawRecord>> {
        if self.concurrency == 1 {
            let mut records = Vec::with_capacity(product_urls.len());
            for url in &product_urls {
                records.push(self.fetch_product_record(url).await?);
            }
            return Ok(records);
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for (idx, url) in product_urls.iter().cloned().enumerate() {
            let this = self.clone();
            let sem = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = sem.acquire_owned().await;
                (idx, this.fetch_product_record(&url).await)
            });
        }

        // The reported failure is the one a sequential walk would hit first:
        // the lowest failing index, once every page before it has finished.
        let mut slots: Vec<Option<RawRecord>> = vec![None; product_urls.len()];
        let mut failure: Option<(usize, CollectError)> = None;
        while let Some(joined) = tasks.join_next().await {
            let (idx, result) = match joined {
                Ok(pair) => pair,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(_) => continue,
            };
            match result {
                Ok(record) => slots[idx] = Some(record),
                Err(e) => {
                    if failure.as_ref().map_or(true, |(first, _)| idx < *first) {
                        failure = Some((idx, e));
                    }
                }
            }
            if let Some((first, _)) = &failure {
                if slots[..*first].iter().all(Option::is_some) {
                    break;
                }
            }
        }

        if let Some((_, e)) = failure {
            tasks.abort_all();
            return Err(e);
        }
        Ok(slots.into_iter().flatten().collect())
    }

    /// Collect the whole catalog into one raw table, brands in menu order and
    /// products in listing order within each brand.
    pub async fn collect(&self, root_url: &str) -> CollectResult<Table> {
        info!("Fetching catalog root: {}", root_url);
        let brands = self.list_brand_pages(root_url).await?;
        info!("Found {} brand pages", brands.len());

        let pb = ProgressBar::new(brands.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} brands ({msg})")?
                .progress_chars("=> "),
        );

        let mut records = Vec::new();
        for brand in &brands {
            pb.set_message(brand.path().trim_start_matches('/').to_string());
            let product_urls = self.list_product_pages(brand).await?;
            debug!("{} products on {}", product_urls.len(), brand);
            records.extend(self.fetch_brand_records(product_urls).await?);
            pb.inc(1);
        }
        pb.finish_and_clear();

        let table = Table::from_records(&records);
        info!(
            "Collected {} products ({} columns) from {} brands",
            table.len(),
            table.width(),
            brands.len()
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn product_html(name: &str, price: &str, specs: Option<&str>) -> String {
        let table = specs
            .map(|rows| format!("<table><tbody>{rows}</tbody></table>"))
            .unwrap_or_default();
        format!(
            r#"<html><body>
            <img class="main_image is-zoomable" src="/img/{name}.jpg">
            <h1 class="h2 desc_top-head-title">{name}</h1>
            <span class="afterpay-full_price">{price}</span>
            <div class="check_read-inner">About {name}.</div>
            {table}
            </body></html>"#
        )
    }

    async fn serve(server: &MockServer, route: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    async fn catalog(server: &MockServer) {
        let base = server.uri();
        serve(
            server,
            "/Racquets.html",
            r#"<ul class="left_menu-section"><li><a href="/Sale.html">Sale</a></li></ul>
               <ul class="left_menu-section">
                 <li><a href="/Babolat.html">Babolat</a></li>
                 <li><a href="/Head.html">Head</a></li>
               </ul>"#
                .to_string(),
        )
        .await;
        serve(
            server,
            "/Babolat.html",
            format!(
                r#"<a class="cattable-wrap-cell-info" href="{base}/p/aero.html">a</a>
                   <a class="cattable-wrap-cell-info" href="https://elsewhere.example/x">x</a>
                   <a class="cattable-wrap-cell-info" href="{base}/p/drive.html">d</a>"#
            ),
        )
        .await;
        serve(
            server,
            "/Head.html",
            format!(r#"<a class="cattable-wrap-cell-info" href="{base}/p/speed.html">s</a>"#),
        )
        .await;
        serve(
            server,
            "/p/aero.html",
            product_html(
                "Babolat Pure Aero",
                "279.00",
                Some(r#"<tr><td class="Specs"><strong>Head Size:</strong> 100 sq in</td></tr>"#),
            ),
        )
        .await;
        serve(
            server,
            "/p/speed.html",
            product_html(
                "Head Speed MP",
                "249.00",
                Some(r#"<tr><td class="Specs"><strong>Grip Size:</strong> 4 3/8</td></tr>"#),
            ),
        )
        .await;
    }

    #[tokio::test]
    async fn collects_brands_then_products_in_order() {
        let server = MockServer::start().await;
        catalog(&server).await;
        serve(&server, "/p/drive.html", product_html("Babolat Pure Drive", "259.00", None)).await;

        for concurrency in [1, 4] {
            let collector = Collector::new(5, concurrency).unwrap();
            let table = collector
                .collect(&format!("{}/Racquets.html", server.uri()))
                .await
                .unwrap();

            let names: Vec<&Value> = table.column("racquet_name").unwrap();
            assert_eq!(
                names,
                vec![
                    &Value::from("Babolat Pure Aero"),
                    &Value::from("Babolat Pure Drive"),
                    &Value::from("Head Speed MP"),
                ]
            );
            // Union of fields: the default spec keys from the specs-less page
            // plus the extra "Grip Size" label from the last one.
            assert!(table.has_column("Head Size"));
            assert!(table.has_column("String Tension"));
            assert!(table.has_column("Grip Size"));
            assert_eq!(table.cell(0, "Grip Size"), Some(&Value::Null));
            assert_eq!(table.cell(2, "Grip Size"), Some(&Value::from("4 3/8")));
            assert_eq!(table.cell(1, "racquet_price"), Some(&Value::Number(259.0)));
        }
    }

    #[tokio::test]
    async fn one_bad_product_aborts_the_run() {
        let server = MockServer::start().await;
        catalog(&server).await;
        serve(
            &server,
            "/p/drive.html",
            "<html><body><h1 class=\"h2 desc_top-head-title\">No image</h1></body></html>".into(),
        )
        .await;

        for concurrency in [1, 3] {
            let collector = Collector::new(5, concurrency).unwrap();
            let err = collector
                .collect(&format!("{}/Racquets.html", server.uri()))
                .await
                .unwrap_err();
            assert!(
                matches!(err, CollectError::MissingField { field: "image", .. }),
                "{err}"
            );
        }
    }

    #[tokio::test]
    async fn concurrent_fetch_reports_first_failure_in_listing_order() {
        let server = MockServer::start().await;
        let base = server.uri();
        serve(
            &server,
            "/Racquets.html",
            r#"<ul class="left_menu-section"></ul>
               <ul class="left_menu-section"><li><a href="/Yonex.html">Yonex</a></li></ul>"#
                .to_string(),
        )
        .await;
        serve(
            &server,
            "/Yonex.html",
            format!(
                r#"<a class="cattable-wrap-cell-info" href="{base}/p/1.html">1</a>
                   <a class="cattable-wrap-cell-info" href="{base}/p/2.html">2</a>"#
            ),
        )
        .await;
        // First listed page fails late (no image), second fails at once (no name).
        Mock::given(method("GET"))
            .and(path("/p/1.html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<h1 class="h2 desc_top-head-title">Yonex EZONE 98</h1>"#)
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
        serve(
            &server,
            "/p/2.html",
            r#"<img class="main_image is-zoomable" src="/img/2.jpg">"#.to_string(),
        )
        .await;

        for concurrency in [1, 4] {
            let collector = Collector::new(5, concurrency).unwrap();
            let err = collector
                .collect(&format!("{base}/Racquets.html"))
                .await
                .unwrap_err();
            match err {
                CollectError::MissingField { url, field } => {
                    assert_eq!(field, "image", "concurrency {concurrency}");
                    assert!(url.ends_with("/p/1.html"), "{url}");
                }
                other => panic!("concurrency {concurrency}: {other}"),
            }
        }
    }

    #[tokio::test]
    async fn http_error_status_aborts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Racquets.html"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let collector = Collector::new(5, 1).unwrap();
        let err = collector
            .list_brand_pages(&format!("{}/Racquets.html", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, CollectError::Http { .. }));
    }
}
