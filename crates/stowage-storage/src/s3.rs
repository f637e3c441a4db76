use crate::keys::{parse_segment_name, segment_key, segment_listing_offset, segment_prefix};
use crate::traits::{ByteStream, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::{stream, StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectMeta, ObjectStore, ObjectStoreExt, PutPayload, Result as ObjectResult};
use std::ops::Range;
use std::sync::Arc;

/// One stored piece of a logical object, covering `[offset, offset + size)`.
#[derive(Debug, Clone)]
struct Segment {
    offset: u64,
    size: u64,
    location: Path,
}

impl Segment {
    fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// S3 storage implementation
///
/// A logical object `key` is stored as segment objects
/// `{key}.segments/{end:020}-{start:020}`, one per written chunk. Reads list the
/// segments and fetch only the ones overlapping the requested bytes.
#[derive(Clone)]
pub struct S3Storage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        // Credentials come from the standard AWS_* environment variables.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store: Arc::new(store),
            bucket,
        })
    }

    /// Wrap an already configured object store.
    pub fn with_store(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        S3Storage {
            store,
            bucket: bucket.into(),
        }
    }

    /// List the segments of `storage_key` in offset order.
    async fn segments(&self, storage_key: &str) -> StorageResult<Vec<Segment>> {
        let prefix = Path::from(segment_prefix(storage_key));
        self.collect_segments(storage_key, self.store.list(Some(&prefix)))
            .await
    }

    /// Segments of `storage_key` that end at or after `offset`, in offset order.
    ///
    /// For an append this is the segment just before `offset` plus any stale
    /// tail, so the listing stays small however many segments precede it.
    async fn segments_reaching(&self, storage_key: &str, offset: u64) -> StorageResult<Vec<Segment>> {
        let prefix = Path::from(segment_prefix(storage_key));
        let after = Path::from(segment_listing_offset(storage_key, offset));
        self.collect_segments(storage_key, self.store.list_with_offset(Some(&prefix), &after))
            .await
    }

    async fn collect_segments(
        &self,
        storage_key: &str,
        listing: BoxStream<'static, ObjectResult<ObjectMeta>>,
    ) -> StorageResult<Vec<Segment>> {
        let metas: Vec<_> = listing.try_collect().await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                "S3 segment listing failed"
            );
            StorageError::BackendError(e.to_string())
        })?;

        let mut segments: Vec<Segment> = metas
            .into_iter()
            .filter_map(|meta| {
                let (start, end) = meta.location.filename().and_then(parse_segment_name)?;
                Some(Segment {
                    offset: start,
                    size: end - start,
                    location: meta.location,
                })
            })
            .collect();
        segments.sort_by_key(|segment| (segment.offset, segment.size));
        Ok(segments)
    }

    /// Segments forming an unbroken run from offset 0.
    ///
    /// A leftover segment from an interrupted rewrite overlaps the run and is
    /// skipped.
    fn chain(segments: &[Segment]) -> Vec<&Segment> {
        let mut end = 0;
        let mut chain = Vec::new();
        for segment in segments {
            if segment.offset > end {
                break;
            }
            if segment.offset == end {
                end = segment.end();
                chain.push(segment);
            }
        }
        chain
    }

    /// Bytes reachable from offset 0 without a hole.
    fn contiguous_length(segments: &[Segment]) -> u64 {
        Self::chain(segments).last().map_or(0, |segment| segment.end())
    }

    async fn segments_or_not_found(&self, storage_key: &str) -> StorageResult<Vec<Segment>> {
        let segments = self.segments(storage_key).await?;
        if segments.is_empty() {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }
        Ok(segments)
    }

    /// For every segment overlapping `range`, its location and the local byte range to fetch.
    fn plan_reads(segments: &[Segment], range: Range<u64>) -> Vec<(Path, Range<u64>)> {
        let end = range.end.min(Self::contiguous_length(segments));
        Self::chain(segments)
            .into_iter()
            .take_while(|segment| segment.offset < end)
            .filter(|segment| segment.end() > range.start && segment.size > 0)
            .map(|segment| {
                let from = range.start.max(segment.offset) - segment.offset;
                let to = end.min(segment.end()) - segment.offset;
                (segment.location.clone(), from..to)
            })
            .collect()
    }

    async fn put_segment(&self, location: &Path, data: Bytes) -> StorageResult<()> {
        let result: ObjectResult<_> = self.store.put(location, PutPayload::from(data)).await;
        result
            .map(|_| ())
            .map_err(|e| StorageError::WriteFailed(e.to_string()))
    }

    async fn fetch(store: Arc<dyn ObjectStore>, location: Path, range: Range<u64>) -> StorageResult<Bytes> {
        let result: ObjectResult<Bytes> = store.get_range(&location, range).await;
        result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(location.to_string()),
            other => StorageError::ReadFailed(other.to_string()),
        })
    }

    async fn delete_segment(&self, location: &Path) -> StorageResult<()> {
        let result: ObjectResult<()> = self.store.delete(location).await;
        match result {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(e.to_string())),
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn write_chunk(&self, storage_key: &str, offset: u64, data: Bytes) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let size = data.len();
        let reaching = self.segments_reaching(storage_key, offset).await?;

        let reaches_offset = offset == 0
            || reaching
                .iter()
                .any(|segment| segment.offset < offset && segment.end() >= offset);
        if !reaches_offset {
            let current = Self::contiguous_length(&self.segments(storage_key).await?);
            return Err(StorageError::InvalidOffset {
                key: storage_key.to_string(),
                offset,
                current,
            });
        }

        // Stored bytes always form one run from 0: the straddling segment is
        // cut back and the tail removed before the new segment lands.
        for segment in &reaching {
            if segment.offset < offset && segment.end() > offset {
                let head = Self::fetch(
                    self.store.clone(),
                    segment.location.clone(),
                    0..offset - segment.offset,
                )
                .await?;
                let cut = Path::from(segment_key(storage_key, segment.offset, offset));
                self.put_segment(&cut, head).await?;
                self.delete_segment(&segment.location).await?;
            } else if segment.offset >= offset {
                self.delete_segment(&segment.location).await?;
            }
        }

        let location = Path::from(segment_key(storage_key, offset, offset + size as u64));
        self.put_segment(&location, data).await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                offset = offset,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 segment upload failed"
            );
            e
        })?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %storage_key,
            offset = offset,
            size_bytes = size,
            listed = reaching.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 segment written"
        );

        Ok(())
    }

    async fn read_range(&self, storage_key: &str, range: Range<u64>) -> StorageResult<Bytes> {
        let segments = self.segments_or_not_found(storage_key).await?;

        let mut buf = BytesMut::new();
        for (location, local) in Self::plan_reads(&segments, range) {
            let bytes = Self::fetch(self.store.clone(), location, local).await?;
            buf.extend_from_slice(&bytes);
        }

        Ok(buf.freeze())
    }

    async fn read_stream(
        &self,
        storage_key: &str,
        limit: Option<u64>,
    ) -> StorageResult<ByteStream> {
        let start = std::time::Instant::now();
        let segments = self.segments_or_not_found(storage_key).await?;
        let plan = Self::plan_reads(&segments, 0..limit.unwrap_or(u64::MAX));

        let store = self.store.clone();
        let bucket = self.bucket.clone();
        let key = storage_key.to_string();

        let stream = stream::iter(plan)
            .then(move |(location, range)| Self::fetch(store.clone(), location, range))
            .map(move |item| {
                if let Err(ref e) = item {
                    tracing::error!(
                        error = %e,
                        bucket = %bucket,
                        key = %key,
                        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                        "S3 stream download error"
                    );
                }
                item
            });

        Ok(Box::pin(stream))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(!self.segments(storage_key).await?.is_empty())
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        let segments = self.segments_or_not_found(storage_key).await?;
        Ok(Self::contiguous_length(&segments))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let segments = self.segments(storage_key).await?;

        for segment in &segments {
            self.delete_segment(&segment.location).await?;
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            segments = segments.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
