// @need-ids: REQ_TOOL_3
pub struct Frame {
    pub bytes: Vec<u8>,
}

impl Frame {
    /// [[Frame length, IMPL_FRAME_LEN, impl, [REQ_TOOL_3]]]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}
