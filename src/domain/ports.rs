use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Harvest parameters, independent of whether they came from flags or a
/// config file.
pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn keyword(&self) -> &str;
    fn pages(&self) -> u32;
    fn page_limit(&self) -> u32;
    fn output_path(&self) -> &str;
    fn modified_after(&self) -> Option<NaiveDate>;
    fn modified_before(&self) -> Option<NaiveDate>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Raw: Send;
    type Output: Send;

    async fn extract(&self) -> Result<Self::Raw>;
    async fn transform(&self, raw: Self::Raw) -> Result<Self::Output>;
    async fn load(&self, output: Self::Output) -> Result<String>;
}
