use core::marker::PhantomData;

use bytes::{Bytes, BytesMut};
use prost::Message;
use xsched_io::FrameReader;

use crate::{read_one_frame, CodecError, MessageCodec, DEFAULT_MAX_MESSAGE_SIZE};

/// Binary protobuf codec using the standard length-delimited-free (one
/// frame == one message) encoding `prost` produces for `encode`/`decode`.
pub struct ProtobufCodec<M> {
    max_message_size: u64,
    _marker: PhantomData<fn() -> M>,
}

impl<M> ProtobufCodec<M> {
    pub const fn new() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            _marker: PhantomData,
        }
    }

    /// Override the default 4 MiB decode ceiling.
    pub const fn with_max_message_size(mut self, max: u64) -> Self {
        self.max_message_size = max;
        self
    }
}

impl<M> Default for ProtobufCodec<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for ProtobufCodec<M> {
    fn clone(&self) -> Self {
        Self {
            max_message_size: self.max_message_size,
            _marker: PhantomData,
        }
    }
}

impl<M> MessageCodec<M> for ProtobufCodec<M>
where
    M: Message + Default,
{
    fn encoder_content_type(&self) -> &'static str {
        "application/x-protobuf"
    }

    fn decoder_content_type(&self) -> &'static str {
        "application/x-protobuf"
    }

    fn encode(&self, msg: &M) -> Result<Bytes, CodecError> {
        let mut buf = BytesMut::with_capacity(msg.encoded_len());
        msg.encode(&mut buf)?;
        Ok(buf.freeze())
    }

    async fn decode<R>(&self, reader: &mut R) -> Result<Option<M>, CodecError>
    where
        R: FrameReader,
    {
        match read_one_frame(reader, self.max_message_size).await? {
            None => Ok(None),
            Some(bytes) => Ok(Some(M::decode(bytes.as_slice())?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use xsched_io::RecordIoReader;

    #[derive(Clone, PartialEq, Message)]
    struct Ping {
        #[prost(string, tag = "1")]
        pub nonce: String,
    }

    #[tokio::test]
    async fn round_trips_a_message() {
        let codec = ProtobufCodec::<Ping>::new();
        let msg = Ping { nonce: "abc".into() };
        let encoded = codec.encode(&msg).unwrap();

        let framed = format!("{}\n", encoded.len());
        let mut body = framed.into_bytes();
        body.extend_from_slice(&encoded);

        let s: Vec<Result<Bytes, std::io::Error>> = vec![Ok(Bytes::from(body))];
        let mut reader = RecordIoReader::new(Box::pin(stream::iter(s)));

        let decoded = codec.decode(&mut reader).await.unwrap().unwrap();
        assert_eq!(decoded, msg);
        assert!(codec.decode(&mut reader).await.unwrap().is_none());
    }
}
