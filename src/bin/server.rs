fn main() {
    stubdns::server::main();
}
