use std::{path::Path, sync::Arc};

use tracing::{error, info};

use crate::file::MidiFile;

/// The files of a session and the position in them.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    files: Vec<Arc<MidiFile>>,
    current: Option<usize>,
    queued: Option<usize>,
}

impl Playlist {
    /// A playlist of already parsed files
    pub fn new(files: impl IntoIterator<Item = MidiFile>) -> Self {
        Self {
            files: files.into_iter().map(Arc::new).collect(),
            current: None,
            queued: None,
        }
    }

    /// Parse every path; files that fail are logged and left out
    pub fn load<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Self {
        let files = paths
            .into_iter()
            .filter_map(|path| match MidiFile::parse_file(path.as_ref()) {
                Ok(file) => {
                    info!("loaded {}", path.as_ref().display());
                    Some(file)
                }
                Err(e) => {
                    error!("skipping {e}");
                    None
                }
            })
            .collect::<Vec<_>>();
        Self::new(files)
    }

    /// Append a file, returning its index
    pub fn push(&mut self, file: MidiFile) -> usize {
        self.files.push(Arc::new(file));
        self.files.len() - 1
    }

    /// Make the file at `index` the next one played
    pub fn queue(&mut self, index: usize) {
        if index < self.files.len() {
            self.queued = Some(index);
        }
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True without files
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The file at `index`
    pub fn get(&self, index: usize) -> Option<Arc<MidiFile>> {
        self.files.get(index).cloned()
    }

    /// Index of the file being played
    pub const fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The file being played
    pub fn current(&self) -> Option<Arc<MidiFile>> {
        self.current.and_then(|i| self.get(i))
    }

    /// All files in order
    pub fn files(&self) -> &[Arc<MidiFile>] {
        &self.files
    }

    /// Move to the next file.
    ///
    /// A queued file goes first. Otherwise a looping playlist stays on the
    /// current file. Returns `None` past the last file.
    pub fn advance(&mut self, looping: bool) -> Option<Arc<MidiFile>> {
        let next = match (self.queued.take(), self.current) {
            (Some(queued), _) => queued,
            (None, None) => 0,
            (None, Some(current)) if looping => current,
            (None, Some(current)) => current + 1,
        };
        let file = self.get(next)?;
        self.current = Some(next);
        Some(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file() -> MidiFile {
        let bytes = [
            b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 1, 0, 1, 0x01, 0xE0, //
            b'M', b'T', b'r', b'k', 0, 0, 0, 4, //
            0x00, 0xFF, 0x2F, 0x00,
        ];
        MidiFile::parse(&bytes).unwrap()
    }

    #[test]
    fn advances_loops_and_jumps() {
        let mut playlist = Playlist::new([file(), file(), file()]);
        assert!(playlist.advance(false).is_some());
        assert_eq!(playlist.current_index(), Some(0));
        playlist.advance(true);
        assert_eq!(playlist.current_index(), Some(0));
        playlist.advance(false);
        assert_eq!(playlist.current_index(), Some(1));

        playlist.queue(0);
        playlist.advance(true);
        assert_eq!(playlist.current_index(), Some(0));

        playlist.advance(false);
        playlist.advance(false);
        assert_eq!(playlist.current_index(), Some(2));
        assert!(playlist.advance(false).is_none());
        assert_eq!(playlist.current_index(), Some(2));
    }

    #[test]
    fn load_skips_unreadable_files() {
        let playlist = Playlist::load(["/nonexistent/song.mid"]);
        assert!(playlist.is_empty());
    }
}
