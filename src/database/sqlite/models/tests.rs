use super::*;

#[test]
fn new_record_round_trips_through_row() {
    let chunk = Chunk {
        source: "b.md".to_string(),
        text: "Equity target is 60%.".to_string(),
    };
    let new_record =
        NewChunkRecord::from_chunk(&chunk, &[0.6, 0.8]).expect("should encode embedding");

    let row = ChunkRecord {
        id: 1,
        source: new_record.source,
        chunk_text: new_record.chunk_text,
        embedding: new_record.embedding,
    };

    let (restored, embedding) = row.into_parts().expect("should decode embedding");
    assert_eq!(restored, chunk);
    assert_eq!(embedding, vec![0.6, 0.8]);
}

#[test]
fn corrupt_embedding_is_reported() {
    let row = ChunkRecord {
        id: 1,
        source: "a.md".to_string(),
        chunk_text: "text".to_string(),
        embedding: vec![42],
    };

    assert!(row.into_parts().is_err());
}
