//! Runs parsed commands against one result store

use std::io::Write;

use tracing::info;

use crate::command::{Command, DEFAULT_SLOT};
use crate::error::Result;
use crate::library::Library;
use crate::store::ResultStore;

pub struct Session<'a> {
    library: Library<'a>,
    store: ResultStore,
}

impl<'a> Session<'a> {
    pub fn new(library: Library<'a>) -> Self {
        Self {
            library,
            store: ResultStore::default(),
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Run every command in order, stopping at the first failure.
    pub async fn run(&mut self, commands: &[Command], out: &mut impl Write) -> Result<()> {
        for command in commands {
            self.execute(command, out).await?;
        }
        Ok(())
    }

    pub async fn execute(&mut self, command: &Command, out: &mut impl Write) -> Result<()> {
        info!(?command, "running command");
        match command {
            Command::FetchMyTracks { limit, save } => {
                let tracks = self.library.fetch_my_tracks(*limit).await?;
                self.store.save(save, tracks);
            }
            Command::SearchByGenre { genre, save } => {
                let tracks = self.library.search_by_genre(genre).await?;
                self.store.save(save, tracks);
            }
            Command::FilterByGenre { genre, load, save } => {
                let loaded = self.store.get(load)?;
                let kept = self.library.filter_by_genre(loaded, genre).await?;
                self.store.save(save, kept);
            }
            Command::Save { name } => {
                let items = self.store.get(DEFAULT_SLOT)?.to_vec();
                self.store.save(name, items);
            }
            Command::Print { name, pretty } => {
                let value = self.store.to_json(name.as_deref())?;
                if *pretty {
                    serde_json::to_writer_pretty(&mut *out, &value)?;
                } else {
                    serde_json::to_writer(&mut *out, &value)?;
                }
                writeln!(out)?;
            }
        }
        Ok(())
    }
}
