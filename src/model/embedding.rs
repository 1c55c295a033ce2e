use rig::embeddings::Embedding;

/// Conversions between rig embeddings and the `F32_BLOB` column format
///
/// rig works in `f64`; the index stores little-endian `f32`.
pub trait EmbeddingConversion {
    fn to_vec(&self) -> Vec<f32>;
    fn from_vec(vec: Vec<f32>) -> Self;
    fn to_binary(&self) -> Vec<u8>;
    fn from_binary(binary: &[u8]) -> Self;
}

impl EmbeddingConversion for Embedding {
    fn to_vec(&self) -> Vec<f32> {
        self.vec.iter().map(|&f| f as f32).collect()
    }

    fn from_vec(vec: Vec<f32>) -> Self {
        Self {
            document: String::new(),
            vec: vec.into_iter().map(f64::from).collect(),
        }
    }

    fn to_binary(&self) -> Vec<u8> {
        self.to_vec()
            .into_iter()
            .flat_map(f32::to_le_bytes)
            .collect()
    }

    /// Trailing bytes that do not form a whole `f32` are ignored
    fn from_binary(binary: &[u8]) -> Self {
        let vec = binary
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Self::from_vec(vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_layout() {
        let embedding = Embedding::from_vec(vec![1.0, -0.5]);
        let binary = embedding.to_binary();

        assert_eq!(binary.len(), 8);
        assert_eq!(&binary[..4], &1.0f32.to_le_bytes());
        assert_eq!(Embedding::from_binary(&binary).to_vec(), vec![1.0, -0.5]);
    }

    #[test]
    fn test_partial_trailing_bytes_ignored() {
        let mut binary = Embedding::from_vec(vec![0.25]).to_binary();
        binary.push(0xFF);
        assert_eq!(Embedding::from_binary(&binary).to_vec(), vec![0.25]);
    }
}
