use crate::core::normalize;
use crate::domain::model::Dataset;
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use url::Url;

/// Query parameters for the catalogue search endpoint. Only `page` varies
/// between the requests of a single harvest.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub keyword: String,
    pub portal: String,
    pub limit: u32,
    pub page: u32,
    pub include_limited: bool,
    pub include_private: bool,
    pub modified_after: Option<NaiveDate>,
    pub modified_before: Option<NaiveDate>,
}

/// Build the full search-result URL. The parameter set matches what the
/// catalogue's own search form submits; the endpoint expects every field to
/// be present even when empty.
pub fn search_url(base_url: &str, query: &SearchQuery) -> Result<Url> {
    let mut url = Url::parse(base_url)?;

    let after = query
        .modified_after
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let before = query
        .modified_before
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    {
        let mut pairs = url.query_pairs_mut();
        pairs
            .append_pair("fulltext", "")
            .append_pair("title", "")
            .append_pair("autocomplete", "")
            .append_pair("keyword", &query.keyword)
            .append_pair("portal", &query.portal)
            .append_pair("statusprogress", "0")
            .append_pair("statusprogress", "1")
            .append_pair("statuspublished", "0")
            .append_pair("statuspublished", "1")
            .append_pair("includelimited", "0");
        if query.include_limited {
            pairs.append_pair("includelimited", "1");
        }
        pairs.append_pair("includeprivate", "0");
        if query.include_private {
            pairs.append_pair("includeprivate", "1");
        }
        pairs
            .append_pair("type_research", "research")
            .append_pair("resulttype", "research")
            .append_pair("modifiedafter", &after)
            .append_pair("modifiedbefore", &before)
            .append_pair("format", "json")
            .append_pair("limit", &query.limit.to_string())
            .append_pair("page", &query.page.to_string());
    }

    Ok(url)
}

pub struct HarvestPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
}

impl<S: Storage, C: ConfigProvider> HarvestPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            client: Client::new(),
        }
    }

    fn page_query(&self, page: u32) -> SearchQuery {
        SearchQuery {
            keyword: self.config.keyword().to_string(),
            limit: self.config.page_limit(),
            page,
            modified_after: self.config.modified_after(),
            modified_before: self.config.modified_before(),
            ..SearchQuery::default()
        }
    }
}

#[async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for HarvestPipeline<S, C> {
    type Raw = Vec<String>;
    type Output = Dataset;

    async fn extract(&self) -> Result<Vec<String>> {
        let mut pages = Vec::with_capacity(self.config.pages() as usize);

        // One request per page, in order. The endpoint has no cursor; the
        // page number is the only thing that changes.
        for page in 0..self.config.pages() {
            let url = search_url(self.config.base_url(), &self.page_query(page))?;
            tracing::debug!("GET {}", url);
            let response = self.client.get(url).send().await?.error_for_status()?;
            let body = response.text().await?;
            tracing::info!("fetched page {} ({} bytes)", page, body.len());
            pages.push(body);
        }

        Ok(pages)
    }

    async fn transform(&self, raw: Vec<String>) -> Result<Dataset> {
        let page_count = raw.len();
        let entries = normalize::coalesce_fragments(&raw.concat())?;
        tracing::info!("normalized {} page(s) into {} entries", page_count, entries.len());
        Ok(Dataset::new(self.config.keyword(), entries))
    }

    async fn load(&self, dataset: Dataset) -> Result<String> {
        let file_name = format!("{}.json", dataset.key);
        let data = serde_json::to_vec(&dataset.to_document())?;

        tracing::debug!("writing {} entries to {}", dataset.len(), file_name);
        self.storage.write_file(&file_name, &data).await?;

        Ok(format!("{}/{}", self.config.output_path(), file_name))
    }
}
