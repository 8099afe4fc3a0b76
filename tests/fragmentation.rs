use proptest::prelude::*;
use wirefeed::{Event, EventRecorder, ParseError, ParserConfig, ParserState, feed};

const CORPUS: &[&[u8]] = &[
    b"GET /foo HTTP/1.1\r\nHost: x\r\n\r\n",
    b"POST /up HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n3\r\nabc\r\n0\r\n\r\n",
    b"PUT /r?q=1 HTTP/1.0\r\nContent-Length: 11\r\nX-Pad:  a  b  \r\n\r\nhello world",
    b"GET / HTTP/1.1\r\nX-Fold: one  \r\n \t two\r\nX-Empty:\r\n\r\n\
      POST /p HTTP/1.1\r\nTransfer-Encoding: gzip, chunked\r\n\r\n\
      a;x=y\r\n0123456789\r\n0\r\nT: v\r\n\r\n",
    b"GET / HTTP/1.1\r\nBroken Header\r\n\r\n",
];

/// Feed `raw` split at `cuts`, stopping at the first error.
fn run(raw: &[u8], cuts: &[usize], config: &ParserConfig) -> (Vec<Event>, Option<ParseError>) {
    let mut state = ParserState::with_config(config.clone());
    let mut rec = EventRecorder::new();
    let mut points: Vec<usize> = cuts.iter().map(|c| c % (raw.len() + 1)).collect();
    points.push(0);
    points.push(raw.len());
    points.sort_unstable();
    points.dedup();

    for pair in points.windows(2) {
        if let Err(err) = feed(&mut state, &raw[pair[0]..pair[1]], &mut rec) {
            return (rec.coalesced(), Some(err));
        }
    }
    (rec.coalesced(), None)
}

proptest! {
    #[test]
    fn events_do_not_depend_on_chunk_boundaries(
        index in 0..CORPUS.len(),
        cuts in prop::collection::vec(any::<usize>(), 0..12),
    ) {
        let raw = CORPUS[index];
        let config = ParserConfig::default();
        prop_assert_eq!(run(raw, &cuts, &config), run(raw, &[], &config));
    }

    #[test]
    fn line_limit_failures_do_not_depend_on_chunk_boundaries(
        index in 0..CORPUS.len(),
        max_line_len in 4usize..40,
        cuts in prop::collection::vec(any::<usize>(), 0..12),
    ) {
        let raw = CORPUS[index];
        let config = ParserConfig { max_line_len, ..ParserConfig::default() };
        prop_assert_eq!(run(raw, &cuts, &config), run(raw, &[], &config));
    }

    #[test]
    fn arbitrary_bytes_never_panic(
        data in prop::collection::vec(any::<u8>(), 0..256),
        split in any::<usize>(),
    ) {
        let mut state = ParserState::new();
        let mut rec = EventRecorder::new();
        let split = split % (data.len() + 1);
        if let Ok(n) = feed(&mut state, &data[..split], &mut rec) {
            prop_assert_eq!(n, split);
            let _ = feed(&mut state, &data[split..], &mut rec);
        }
    }
}
