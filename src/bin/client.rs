fn main() {
    stubdns::client::main();
}
