pub trait ResponseSink {
    fn send_response(&self, response_url: &str, body: &[u8]) -> Result<(), String>;
}
