//! Terminal client constants.

/// Shell prompt.
pub const PROMPT: &str = "folio> ";

/// Characters of block text shown per line in `ls`.
pub const SUMMARY_WIDTH: usize = 60;

pub const HELP: &str = "\
commands:
  ls                              list blocks
  add text <style> <content>      append a text block (style: h1 h2 h3 p)
  add image <url> [w h]           append an image block
  upload <path>                   upload an image file and append it
  edit <index> <content>          replace a text block's content
  style <index> <style>           change a text block's style
  size <index> <w> <h>            set an image block's dimensions
  mv <from> <to>                  move a block (drag and drop)
  drag <index> | over <index>     drive a drag gesture step by step
  drop | cancel                   finish or abandon the drag
  undo | redo                     walk the history
  ^z | ^Z                         undo/redo through the key dispatcher
  focus doc | focus text          where key chords land
  reload                          fetch the document from the store
  help | quit";
