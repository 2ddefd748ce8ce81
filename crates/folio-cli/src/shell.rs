//! The interactive shell: commands in, editor session operations out.

use std::io::{self, Write};
use std::sync::Arc;

use folio_client::{
    CommitOutcome, EditorSession, HttpBlockStore, InputContext, KeyEvent, Platform,
    ShortcutDispatcher,
};
use folio_store::{BlockStore, StoreResult};
use folio_types::{BlockDraft, BlockId, BlockKind, BlockPatch};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::command::{Command, CommandError};
use crate::constants::{HELP, PROMPT};
use crate::render::format_blocks;

/// Whether the shell keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell {
    session: EditorSession,
    platform: Platform,
    focus: InputContext,
    /// Present when talking to a server; enables `upload`.
    uploader: Option<HttpBlockStore>,
}

impl Shell {
    pub fn new(store: Arc<dyn BlockStore>, platform: Platform) -> Self {
        Self {
            session: EditorSession::with_dispatcher(store, ShortcutDispatcher::new(platform)),
            platform,
            focus: InputContext::Document,
            uploader: None,
        }
    }

    /// Shell over an HTTP store, with image upload enabled.
    pub fn over_http(store: HttpBlockStore, platform: Platform) -> Self {
        let mut shell = Self::new(Arc::new(store.clone()), platform);
        shell.uploader = Some(store);
        shell
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    /// Load the document. Failure leaves an empty list and a notice.
    pub async fn load(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.session.load().await.is_ok() {
            writeln!(out, "loaded {} blocks", self.session.blocks().len())?;
        }
        self.flush_notice(out)
    }

    /// Read commands until `quit` or end of input.
    pub async fn run<R>(&mut self, input: R, out: &mut impl Write) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;
            let Some(line) = lines.next_line().await? else {
                writeln!(out)?;
                break;
            };
            match Command::parse(&line) {
                Ok(command) => {
                    if self.execute(command, out).await? == Flow::Quit {
                        break;
                    }
                }
                Err(CommandError::Empty) => {}
                Err(e) => writeln!(out, "{e}")?,
            }
        }
        Ok(())
    }

    pub async fn execute(&mut self, command: Command, out: &mut impl Write) -> io::Result<Flow> {
        debug!(?command, "executing");
        match command {
            Command::List => self.list(out)?,
            Command::AddText { style, content } => {
                let draft = BlockDraft::text(style, content, 0);
                self.add(draft, out).await?;
            }
            Command::AddImage { url, width, height } => {
                let draft = BlockDraft::image(url, width, height, 0);
                self.add(draft, out).await?;
            }
            Command::Upload { path } => {
                let Some(uploader) = self.uploader.clone() else {
                    writeln!(out, "upload needs a server (run without --memory)")?;
                    return Ok(Flow::Continue);
                };
                match uploader.upload_image(&path).await {
                    Ok(url) => {
                        writeln!(out, "uploaded {url}")?;
                        self.add(BlockDraft::image(url, None, None, 0), out).await?;
                    }
                    Err(e) => writeln!(out, "upload failed: {e}")?,
                }
            }
            Command::Edit { index, content } => {
                if let Some(id) = self.text_block(index, out)? {
                    let patch = BlockPatch {
                        content: Some(Some(content)),
                        ..Default::default()
                    };
                    self.edit(id, patch, out).await?;
                }
            }
            Command::Style { index, style } => {
                if let Some(id) = self.text_block(index, out)? {
                    let patch = BlockPatch {
                        style: Some(style),
                        ..Default::default()
                    };
                    self.edit(id, patch, out).await?;
                }
            }
            Command::Size {
                index,
                width,
                height,
            } => {
                if let Some(id) = self.block_of_kind(index, BlockKind::Image, out)? {
                    let patch = BlockPatch {
                        width: Some(Some(width)),
                        height: Some(Some(height)),
                        ..Default::default()
                    };
                    self.edit(id, patch, out).await?;
                }
            }
            Command::Move { from, to } => {
                let len = self.session.blocks().len();
                if from >= len || to >= len {
                    writeln!(out, "index out of range (0..{len})")?;
                } else {
                    self.session.drag_start(from);
                    self.session.drag_over(to);
                    let result = self.session.drag_end().await;
                    self.report_commit(result, out)?;
                }
            }
            Command::DragStart(index) => {
                self.session.drag_start(index);
                if self.session.is_dragging() {
                    self.list(out)?;
                } else {
                    writeln!(out, "no block at {index}")?;
                }
            }
            Command::DragOver(index) => {
                if self.session.is_dragging() {
                    self.session.drag_over(index);
                    self.list(out)?;
                } else {
                    writeln!(out, "not dragging")?;
                }
            }
            Command::Drop => {
                let result = self.session.drag_end().await;
                self.report_commit(result, out)?;
            }
            Command::Cancel => {
                self.session.cancel_drag();
                self.list(out)?;
            }
            Command::Undo => {
                let result = self.session.undo().await;
                self.report_commit(result, out)?;
            }
            Command::Redo => {
                let result = self.session.redo().await;
                self.report_commit(result, out)?;
            }
            Command::Chord(chord) => match KeyEvent::from_caret(&chord, self.platform) {
                Some(event) => {
                    let outcome = self.session.handle_key(event, self.focus).await;
                    match outcome.action {
                        Some(action) => {
                            writeln!(out, "{action:?}")?;
                            self.list(out)?;
                        }
                        None => writeln!(out, "(no action)")?,
                    }
                }
                None => writeln!(out, "not a chord: {chord}")?,
            },
            Command::Focus(context) => {
                self.focus = context;
                writeln!(out, "focus: {context:?}")?;
            }
            Command::Reload => {
                if self.session.load().await.is_ok() {
                    self.list(out)?;
                }
            }
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }
        self.flush_notice(out)?;
        Ok(Flow::Continue)
    }

    fn list(&self, out: &mut impl Write) -> io::Result<()> {
        for row in format_blocks(self.session.blocks(), self.session.dragged_index()) {
            writeln!(out, "{row}")?;
        }
        Ok(())
    }

    async fn add(&mut self, draft: BlockDraft, out: &mut impl Write) -> io::Result<()> {
        let index = self.session.blocks().len();
        if self.session.create_block(draft).await.is_ok() {
            writeln!(out, "added block {index}")?;
        }
        Ok(())
    }

    async fn edit(&mut self, id: BlockId, patch: BlockPatch, out: &mut impl Write) -> io::Result<()> {
        if self.session.edit_block(id, patch).await.is_ok() {
            self.list(out)?;
        }
        Ok(())
    }

    fn text_block(&self, index: usize, out: &mut impl Write) -> io::Result<Option<BlockId>> {
        self.block_of_kind(index, BlockKind::Text, out)
    }

    fn block_of_kind(
        &self,
        index: usize,
        kind: BlockKind,
        out: &mut impl Write,
    ) -> io::Result<Option<BlockId>> {
        match self.session.blocks().get(index) {
            Some(block) if block.kind() == kind => Ok(Some(block.id)),
            Some(block) => {
                writeln!(out, "block {index} is {}, not {kind}", block.kind())?;
                Ok(None)
            }
            None => {
                writeln!(out, "no block at {index}")?;
                Ok(None)
            }
        }
    }

    fn report_commit(
        &self,
        result: StoreResult<Option<CommitOutcome>>,
        out: &mut impl Write,
    ) -> io::Result<()> {
        match result {
            Ok(Some(_)) => self.list(out),
            Ok(None) => writeln!(out, "nothing to do"),
            // The session has already set a notice.
            Err(_) => Ok(()),
        }
    }

    fn flush_notice(&mut self, out: &mut impl Write) -> io::Result<()> {
        if let Some(notice) = self.session.take_notice() {
            writeln!(out, "! {notice}")?;
        }
        Ok(())
    }
}
