use crate::core::extractor::PriceExtractor;
use crate::domain::model::{Currency, PriceObservation};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 取得原始網頁內容；任何非 2xx 或連線錯誤都回傳 `EtlError::TransportError`
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// One implementation per page layout.
pub trait SiteParser: Send + Sync {
    fn name(&self) -> &'static str;

    fn parse(
        &self,
        markup: &str,
        currency: Currency,
        extractor: &PriceExtractor,
    ) -> Result<PriceObservation>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Extracted: Send;
    type Transformed: Send;

    async fn extract(&self) -> Result<Self::Extracted>;
    async fn transform(&self, data: Self::Extracted) -> Result<Self::Transformed>;
    async fn load(&self, result: Self::Transformed) -> Result<String>;
}
