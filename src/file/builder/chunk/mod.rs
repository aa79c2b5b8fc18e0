#![doc = r#"
Readers for the two chunk types of a Standard MIDI File.

MIDI files are organized into chunks, each identified by a 4-character ASCII
type identifier followed by a 32-bit big-endian length field and the chunk
data.

## [`Header`]

The header chunk (`MThd`) must be the first chunk in a file. It always has
a length of 6 and holds the [`FormatType`](crate::file::FormatType), the
number of track chunks that follow and the time division.

## Track chunks

Track chunks (`MTrk`) hold a sequence of events, each preceded by a
variable-length delta time:

```text
<delta-time:VarLen> <status | running status> <type specific bytes>
```

# Example Structure

```text
[Header Chunk: "MThd"]
[Track Chunk 1: "MTrk"]
[Track Chunk 2: "MTrk"]
...
[Track Chunk N: "MTrk"]
```
"#]

mod header;
pub use header::*;

mod track;
pub(crate) use track::TrackChunkReader;
pub use track::TRACK_ID;
