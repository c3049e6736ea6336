use core::marker::PhantomData;

use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use xsched_io::FrameReader;

use crate::{read_one_frame, CodecError, MessageCodec, DEFAULT_MAX_MESSAGE_SIZE};

/// Protobuf-JSON mapping codec: emits default-valued fields (unlike
/// `serde_json`'s usual `skip_serializing_if` conventions) so the wire
/// shape matches what a canonical protobuf-JSON printer would produce.
pub struct JsonCodec<M> {
    max_message_size: u64,
    _marker: PhantomData<fn() -> M>,
}

impl<M> JsonCodec<M> {
    pub const fn new() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            _marker: PhantomData,
        }
    }

    pub const fn with_max_message_size(mut self, max: u64) -> Self {
        self.max_message_size = max;
        self
    }
}

impl<M> Default for JsonCodec<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for JsonCodec<M> {
    fn clone(&self) -> Self {
        Self {
            max_message_size: self.max_message_size,
            _marker: PhantomData,
        }
    }
}

impl<M> MessageCodec<M> for JsonCodec<M>
where
    M: Serialize + DeserializeOwned + Send + Sync,
{
    fn encoder_content_type(&self) -> &'static str {
        "application/json"
    }

    fn decoder_content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode(&self, msg: &M) -> Result<Bytes, CodecError> {
        Ok(Bytes::from(serde_json::to_vec(msg)?))
    }

    async fn decode<R>(&self, reader: &mut R) -> Result<Option<M>, CodecError>
    where
        R: FrameReader,
    {
        match read_one_frame(reader, self.max_message_size).await? {
            None => Ok(None),
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        }
    }
}
