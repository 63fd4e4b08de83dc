use crate::cache::error::FetchError;
use async_compression::tokio::bufread::GzipDecoder;
use futures_util::TryStreamExt;
use log::{info, warn};
use reqwest::{Client, RequestBuilder, Response};
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;

/// Sends a request and maps connection failures and non-success statuses
/// into fetch errors carrying `url`. The underlying error is stripped of
/// its own URL copy, which may hold credentials in its query string; the
/// bare `url` is all that reaches logs and error text.
pub(crate) async fn send_checked(
    request: RequestBuilder,
    url: &str,
) -> Result<Response, FetchError> {
    let response = request
        .send()
        .await
        .map_err(|e| FetchError::Network(url.to_string(), e.without_url()))?;

    match response.error_for_status() {
        Ok(response) => Ok(response),
        Err(e) => {
            let e = e.without_url();
            warn!("HTTP error for {}: {:?}", url, e);
            Err(if let Some(status) = e.status() {
                FetchError::HttpStatus {
                    url: url.to_string(),
                    status,
                    source: e,
                }
            } else {
                FetchError::Network(url.to_string(), e)
            })
        }
    }
}

/// Downloads a body as plain bytes.
pub(crate) async fn fetch_bytes(client: &Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let response = send_checked(client.get(url), url).await?;
    let body = response
        .bytes()
        .await
        .map_err(|e| FetchError::Network(url.to_string(), e))?;
    Ok(body.to_vec())
}

/// Downloads a gzip-compressed body and returns the decompressed bytes,
/// decompressing the stream as it arrives.
pub(crate) async fn fetch_gzipped_bytes(
    client: &Client,
    url: &str,
) -> Result<Vec<u8>, FetchError> {
    let response = send_checked(client.get(url), url).await?;

    let stream = response
        .bytes_stream()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
    let stream_reader = StreamReader::new(stream);
    let mut decoder = GzipDecoder::new(stream_reader);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .await
        .map_err(|e| FetchError::DownloadIo(url.to_string(), e))?;
    info!(
        "Downloaded and decompressed {} bytes from {}",
        decompressed.len(),
        url
    );
    Ok(decompressed)
}
