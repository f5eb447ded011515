//! Strip and tile encoding
//!
//! The dual of the decoder: forward predictor on the raw rows, compress,
//! then reverse the fill order when LSB-first output was asked for.

use log::debug;

use crate::codec::layout::ChunkLayout;
use crate::codec::predictor;
use crate::compression::{CodecParams, CompressionFactory, CompressionHandler};
use crate::io::byte_order::ByteOrder;
use crate::tiff::constants::{fill_order, predictor as predictor_values};
use crate::tiff::errors::TiffResult;
use crate::utils::tiff_code_translators::compression_code_to_name;

/// Encodes chunks of one frame
pub struct ChunkEncoder {
    layout: ChunkLayout,
    handler: Box<dyn CompressionHandler>,
    predictor: u16,
    fill_order: u16,
    byte_order: ByteOrder,
}

impl ChunkEncoder {
    /// Creates an encoder for `scheme` with the given codec parameters
    ///
    /// The chunk width and sample count in `params` are taken from the layout.
    pub fn new(layout: ChunkLayout, scheme: u16, params: &CodecParams, predictor: u16,
               fill_order: u16, byte_order: ByteOrder) -> TiffResult<Self> {
        let params = CodecParams {
            width: layout.tile.map_or(layout.width, |(w, _)| w),
            samples: layout.chunk_samples(),
            ..params.clone()
        };
        let handler = CompressionFactory::create_handler(scheme as u64, &params)?;
        debug!("Chunk encoder: {}, predictor {}, fill order {}",
               compression_code_to_name(scheme as u64), predictor, fill_order);
        Ok(ChunkEncoder { layout, handler, predictor, fill_order, byte_order })
    }

    /// Encodes one chunk of raw rows, in stream byte order
    pub fn encode_chunk(&self, raw: &[u8]) -> TiffResult<Vec<u8>> {
        let mut data = raw.to_vec();
        if self.predictor == predictor_values::HORIZONTAL {
            let row_bytes = if self.layout.is_tiled() {
                self.layout.tile_row_size()
            } else {
                self.layout.scanline_size()
            };
            predictor::apply_horizontal(&mut data, row_bytes as usize, self.layout.chunk_samples(),
                                        self.layout.bits_per_sample, self.byte_order)?;
        }
        let mut encoded = self.handler.compress(&data)?;
        if self.fill_order == fill_order::LSB2MSB {
            predictor::reverse_fill_order(&mut encoded);
        }
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiff::constants::compression;

    #[test]
    fn test_predictor_applied_before_compression() {
        let layout = ChunkLayout::stripped(4, 1, 8, 1, false, 1);
        let encoder = ChunkEncoder::new(layout, compression::NONE, &CodecParams::default(),
                                        predictor_values::HORIZONTAL, fill_order::MSB2LSB,
                                        ByteOrder::LittleEndian).unwrap();
        assert_eq!(encoder.encode_chunk(&[5, 6, 8, 8]).unwrap(), vec![5, 1, 2, 0]);
    }

    #[test]
    fn test_lsb_fill_order() {
        let layout = ChunkLayout::stripped(8, 1, 1, 1, false, 1);
        let encoder = ChunkEncoder::new(layout, compression::NONE, &CodecParams::default(),
                                        predictor_values::NONE, fill_order::LSB2MSB,
                                        ByteOrder::BigEndian).unwrap();
        assert_eq!(encoder.encode_chunk(&[0x01]).unwrap(), vec![0x80]);
    }
}
