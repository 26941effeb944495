use crate::error::Result;

/// File storage, supplied by the embedding application. The returned
/// reference string is what posts carry as `image_ref`; this crate never
/// interprets it.
#[allow(async_fn_in_trait)]
pub trait BlobStore {
    async fn store(&self, content: &[u8], filename: &str) -> Result<String>;
}
